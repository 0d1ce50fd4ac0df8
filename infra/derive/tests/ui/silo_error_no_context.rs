use silo_derive::silo_error;

#[silo_error]
pub enum StageError {
    #[error("Stage I/O failure: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

fn main() {}
