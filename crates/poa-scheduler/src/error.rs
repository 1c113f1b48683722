/// Errors raised while constructing or driving a [`crate::Scheduler`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("unauthorized block proposer")]
    ErrUnauthorizedProposer,
    #[error("invalid block time")]
    ErrInvalidBlockTime,
}
