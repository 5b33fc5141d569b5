/// Asserts an `Option` is `None`, showing the value otherwise.
#[macro_export]
macro_rules! assert_none {
    ($e:expr) => {
        match &$e {
            None => {}
            Some(actual) => panic!("expected `{}` to be `None`; actual={:?}", stringify!($e), actual),
        }
    };
}
