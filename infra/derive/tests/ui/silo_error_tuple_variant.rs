use silo_derive::silo_error;

#[silo_error]
pub enum StageError {
    #[error("Stage I/O failure: {0}")]
    Io(std::io::Error),
}

fn main() {}
