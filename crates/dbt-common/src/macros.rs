/// fs_err! constructs a boxed FsError from an error code and a format string
#[macro_export]
macro_rules! fs_err {
    ($code:expr, $($arg:tt)+) => {
        Box::new($crate::FsError::new($code, format!($($arg)+)))
    };
}
