//! Call arguments captured for the input log.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered arguments of one call.
///
/// Each argument is captured by its `Debug` rendering when it is added.
/// The list serializes as a tuple literal, which keeps the replay report
/// readable and makes a single argument unambiguous:
///
/// ```text
/// ()        no arguments
/// (3,)      one argument
/// (3, 5)    two arguments
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallArgs {
    rendered: Vec<String>,
}

impl CallArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one argument.
    pub fn arg<T: fmt::Debug + ?Sized>(mut self, value: &T) -> Self {
        self.push(value);
        self
    }

    /// Appends one argument in place.
    pub fn push<T: fmt::Debug + ?Sized>(&mut self, value: &T) {
        self.rendered.push(format!("{:?}", value));
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    /// Returns true if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rendered.as_slice() {
            [] => f.write_str("()"),
            [single] => write!(f, "({},)", single),
            many => write!(f, "({})", many.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(CallArgs::new(), "()" ; "no arguments")]
    #[test_case(CallArgs::new().arg(&3), "(3,)" ; "single argument")]
    #[test_case(CallArgs::new().arg(&3).arg(&5), "(3, 5)" ; "two arguments")]
    #[test_case(CallArgs::new().arg("foo"), "(\"foo\",)" ; "string is quoted")]
    #[test_case(CallArgs::new().arg(&vec![1, 2]).arg(&None::<u8>), "([1, 2], None)" ; "nested values")]
    fn test_render(args: CallArgs, expected: &str) {
        assert_eq!(args.to_string(), expected);
    }

    #[test]
    fn test_push_in_place() {
        let mut args = CallArgs::new();
        assert!(args.is_empty());
        args.push(&42u64);
        args.push(&-1i32);
        assert_eq!(args.len(), 2);
        assert_eq!(args.to_string(), "(42, -1)");
    }
}
