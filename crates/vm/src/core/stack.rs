use std::fmt::Display;

use alloy::primitives::U256;

use crate::{core::constants::STACK_LIMIT, error::Error};

/// The [`Stack`] struct represents the EVM stack.
/// It is a bounded LIFO structure holding at most [`STACK_LIMIT`] words.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Stack {
    /// The items on the stack. The last element is the top of the stack.
    data: Vec<U256>,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Creates a new, empty [`Stack`].
    ///
    /// ```
    /// use cinder_vm::core::stack::Stack;
    ///
    /// let stack = Stack::new();
    /// assert_eq!(stack.size(), 0);
    /// ```
    pub fn new() -> Stack {
        Stack { data: Vec::with_capacity(STACK_LIMIT) }
    }

    /// Push a value onto the stack.
    ///
    /// ```
    /// use cinder_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00)).expect("stack overflow");
    /// assert_eq!(stack.size(), 1);
    /// ```
    #[inline]
    pub fn push(&mut self, value: U256) -> Result<(), Error> {
        if self.data.len() >= STACK_LIMIT {
            return Err(Error::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value off the stack.
    ///
    /// ```
    /// use cinder_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x01)).expect("stack overflow");
    ///
    /// assert_eq!(stack.pop(), Ok(U256::from(0x01)));
    /// assert!(stack.pop().is_err());
    /// ```
    #[inline]
    pub fn pop(&mut self) -> Result<U256, Error> {
        self.data.pop().ok_or(Error::StackUnderflow)
    }

    /// Pop `N` values off the stack. Index 0 of the result is the former top of the stack.
    ///
    /// ```
    /// use cinder_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00)).expect("stack overflow");
    /// stack.push(U256::from(0x01)).expect("stack overflow");
    /// stack.push(U256::from(0x02)).expect("stack overflow");
    ///
    /// // stack is now [0x02, 0x01, 0x00]
    /// let [a, b] = stack.pop_n::<2>().expect("stack underflow");
    /// assert_eq!(a, U256::from(0x02));
    /// assert_eq!(b, U256::from(0x01));
    ///
    /// // stack is now [0x00]
    /// assert_eq!(stack.size(), 1);
    /// ```
    #[inline]
    pub fn pop_n<const N: usize>(&mut self) -> Result<[U256; N], Error> {
        let values = self.peek_n::<N>()?;
        self.data.truncate(self.data.len() - N);
        Ok(values)
    }

    /// Peek at the value `depth` items below the top of the stack.
    ///
    /// ```
    /// use cinder_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00)).expect("stack overflow");
    /// stack.push(U256::from(0x01)).expect("stack overflow");
    ///
    /// assert_eq!(stack.peek(0), Ok(U256::from(0x01)));
    /// assert_eq!(stack.peek(1), Ok(U256::from(0x00)));
    /// assert!(stack.peek(2).is_err());
    /// ```
    #[inline]
    pub fn peek(&self, depth: usize) -> Result<U256, Error> {
        self.data
            .len()
            .checked_sub(depth + 1)
            .and_then(|index| self.data.get(index))
            .copied()
            .ok_or(Error::StackUnderflow)
    }

    /// Gets the top `N` values of the stack without removing them. Index 0 is the top.
    pub fn peek_n<const N: usize>(&self) -> Result<[U256; N], Error> {
        let len = self.data.len();
        if len < N {
            return Err(Error::StackUnderflow);
        }

        let mut values = [U256::ZERO; N];
        for (i, value) in values.iter_mut().enumerate() {
            *value = self.data[len - 1 - i];
        }
        Ok(values)
    }

    /// Swap the top value and the nth value below it.
    ///
    /// ```
    /// use cinder_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00)).expect("stack overflow");
    /// stack.push(U256::from(0x01)).expect("stack overflow");
    ///
    /// // stack is now [0x01, 0x00]
    /// stack.swap(1).expect("stack underflow");
    ///
    /// // stack is now [0x00, 0x01]
    /// assert_eq!(stack.pop(), Ok(U256::from(0x00)));
    /// assert_eq!(stack.pop(), Ok(U256::from(0x01)));
    /// ```
    pub fn swap(&mut self, n: usize) -> Result<(), Error> {
        let len = self.data.len();
        if n == 0 || len < n + 1 {
            return Err(Error::StackUnderflow);
        }
        self.data.swap(len - 1, len - 1 - n);
        Ok(())
    }

    /// Duplicate the nth value on the stack, where `dup(1)` copies the top.
    ///
    /// ```
    /// use cinder_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x07)).expect("stack overflow");
    ///
    /// stack.dup(1).expect("stack underflow");
    /// assert_eq!(stack.pop_n::<2>(), Ok([U256::from(0x07), U256::from(0x07)]));
    /// ```
    pub fn dup(&mut self, n: usize) -> Result<(), Error> {
        let value = n.checked_sub(1).ok_or(Error::StackUnderflow).and_then(|d| self.peek(d))?;
        self.push(value)
    }

    /// Checks that an instruction consuming `inputs` items and producing `outputs` items can run
    /// to completion on this stack.
    #[inline]
    pub fn require(&self, inputs: usize, outputs: usize) -> Result<(), Error> {
        let len = self.data.len();
        if len < inputs {
            return Err(Error::StackUnderflow);
        }
        if len - inputs + outputs > STACK_LIMIT {
            return Err(Error::StackOverflow);
        }
        Ok(())
    }

    /// Get the size of the stack
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if the stack is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The items on the stack, bottom first.
    #[inline]
    pub fn as_slice(&self) -> &[U256] {
        &self.data
    }
}

impl Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stack = self.data.iter().rev().map(|v| format!("{v:#x}")).collect::<Vec<_>>();
        write!(f, "[{}]", stack.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_identity() {
        let mut stack = Stack::new();
        stack.push(U256::from(0xdead)).expect("stack overflow");
        assert_eq!(stack.pop(), Ok(U256::from(0xdead)));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_push_up_to_capacity() {
        let mut stack = Stack::new();
        for i in 0..STACK_LIMIT {
            stack.push(U256::from(i)).expect("stack overflow");
        }
        assert_eq!(stack.size(), 1024);
        assert_eq!(stack.push(U256::ZERO), Err(Error::StackOverflow));
        assert_eq!(stack.dup(1), Err(Error::StackOverflow));
        assert_eq!(stack.size(), 1024);
    }

    #[test]
    fn test_pop_empty_underflows() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(Error::StackUnderflow));
        assert_eq!(stack.pop_n::<1>(), Err(Error::StackUnderflow));
    }

    #[test]
    fn test_pop_n_leaves_stack_untouched_on_underflow() {
        let mut stack = Stack::new();
        stack.push(U256::from(1)).expect("stack overflow");
        assert_eq!(stack.pop_n::<2>(), Err(Error::StackUnderflow));
        assert_eq!(stack.size(), 1);
    }

    #[test]
    fn test_dup_and_swap_depth_checks() {
        let mut stack = Stack::new();
        stack.push(U256::from(1)).expect("stack overflow");
        stack.push(U256::from(2)).expect("stack overflow");

        assert_eq!(stack.dup(3), Err(Error::StackUnderflow));
        assert_eq!(stack.dup(0), Err(Error::StackUnderflow));
        assert_eq!(stack.swap(2), Err(Error::StackUnderflow));

        stack.dup(2).expect("stack underflow");
        assert_eq!(stack.peek_n::<3>(), Ok([U256::from(1), U256::from(2), U256::from(1)]));
    }

    #[test]
    fn test_require() {
        let mut stack = Stack::new();
        assert_eq!(stack.require(1, 1), Err(Error::StackUnderflow));
        assert_eq!(stack.require(0, 1), Ok(()));

        for _ in 0..STACK_LIMIT {
            stack.push(U256::ZERO).expect("stack overflow");
        }
        assert_eq!(stack.require(0, 1), Err(Error::StackOverflow));
        assert_eq!(stack.require(2, 1), Ok(()));
    }

    #[test]
    fn test_display() {
        let mut stack = Stack::new();
        stack.push(U256::from(1)).expect("stack overflow");
        stack.push(U256::from(255)).expect("stack overflow");
        assert_eq!(stack.to_string(), "[0xff, 0x1]");
    }
}
