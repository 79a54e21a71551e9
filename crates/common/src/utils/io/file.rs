use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use eyre::{eyre, Result};

/// Write contents to a file on the disc, creating parent directories as needed.
///
/// ```no_run
/// use cinder_common::utils::io::file::write_file;
///
/// let result = write_file("/tmp/cinder/config.toml", "max_call_depth = 1024");
/// ```
pub fn write_file(path_str: &str, contents: &str) -> Result<()> {
    let path = Path::new(path_str);

    // Create the directory if it doesn't exist
    std::fs::create_dir_all(path.parent().ok_or_else(|| eyre!("unable to create directory"))?)?;

    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;

    Ok(())
}

/// Read contents from a file on the disc
///
/// ```no_run
/// use cinder_common::utils::io::file::read_file;
///
/// let contents = read_file("/tmp/cinder/config.toml");
/// ```
pub fn read_file(path: &str) -> Result<String> {
    let mut file = File::open(Path::new(path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Delete a file from the disc. Returns `true` if a file was removed.
pub fn delete_file(path: &str) -> bool {
    std::fs::remove_file(Path::new(path)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> String {
        std::env::temp_dir()
            .join("cinder-common-tests")
            .join(name)
            .to_str()
            .expect("temp dir is not utf-8")
            .to_string()
    }

    #[test]
    fn test_write_then_read_file() {
        let path = scratch_path("roundtrip.txt");
        write_file(&path, "Hello, World!").expect("unable to write file");

        assert_eq!(read_file(&path).expect("unable to read file"), "Hello, World!");
        assert!(delete_file(&path));
    }

    #[test]
    fn test_read_file_failure() {
        assert!(read_file("/nonexistent/cinder/test.txt").is_err());
    }

    #[test]
    fn test_delete_missing_file() {
        assert!(!delete_file(&scratch_path("never-created.txt")));
    }
}
