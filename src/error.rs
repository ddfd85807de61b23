use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavError {
    #[error("Screen not found: {0}")]
    ScreenNotFound(u8),
}
