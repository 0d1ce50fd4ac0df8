use silo_derive::silo_error;

#[silo_error]
pub enum StageError {
    #[error("Stage I/O failure: {source}")]
    Io { source: std::io::Error, context: Option<String> },
}

fn main() {}
