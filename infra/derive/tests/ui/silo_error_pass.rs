use silo_derive::silo_error;
use std::borrow::Cow;

#[silo_error]
pub enum StageError {
    #[error("Stage I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Rejected key{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal stage error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open_missing() -> Result<std::fs::File, StageError> {
    std::fs::File::open("/definitely/not/here").context("opening stage")
}

fn main() {
    let err = open_missing().unwrap_err();
    assert!(err.to_string().contains("(opening stage)"));

    let err: StageError = "boom".into();
    assert!(matches!(err, StageError::Internal { .. }));

    let rejected: Result<(), StageError> =
        Err(StageError::Rejected { message: "../etc".into(), context: None });
    let err = rejected.context("resolving key").unwrap_err();
    assert_eq!(err.to_string(), "Rejected key (resolving key): ../etc");
}
