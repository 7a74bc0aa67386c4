use thiserror::Error;

/// Everything that can go wrong during a transaction.
///
/// All of these are recovered by the controller itself: each one is shown to the user and leads to
/// a defined state, none of them ever leaves the state machine as an `Err`.
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum TransactionError {
    #[error("account does not exist")]
    UnknownAccount,
    #[error("account is blocked")]
    AccountBlocked,
    #[error("wrong password, {remaining} attempts remaining")]
    WrongPassword { remaining: u8 },
    #[error("too many failed attempts, account blocked")]
    TooManyAttempts,
    #[error("session timed out")]
    SessionTimeout,
    #[error("no {face_value} notes left")]
    OutOfStock { face_value: u64 },
    #[error("insufficient funds, balance is {balance}")]
    InsufficientFunds { balance: u64 },
    #[error("passwords do not match")]
    PasswordMismatch,
}
