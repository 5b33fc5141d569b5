/// Unwraps an `Err`, panicking with the `Ok` value otherwise. Extra
/// arguments are formatted into the panic message.
#[macro_export]
macro_rules! assert_err {
    ($e:expr $(, $($t:tt)* )?) => {
        match $e {
            Err(e) => e,
            actual => {
                let context: Option<String> = None $( .or(Some(format!($($t)*))) )?;
                match context {
                    Some(context) => panic!("expected `Err`; actual={:?}, {}", actual, context),
                    None => panic!("expected `Err`; actual={:?}", actual),
                }
            }
        }
    };
}

/// Unwraps an `Ok`, panicking with the error's display otherwise.
#[macro_export]
macro_rules! assert_ok {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => panic!("expected `Ok`; error=\"{}\"", e),
        }
    };
}

/// Asserts the display of an error (or any `Display` value) contains
/// `$needle`.
#[macro_export]
macro_rules! assert_message {
    ($err:expr, $needle:expr) => {{
        let message = $err.to_string();
        assert!(
            message.contains($needle),
            "expected message to contain {:?}; actual={:?}",
            $needle,
            message,
        );
    }};
}
