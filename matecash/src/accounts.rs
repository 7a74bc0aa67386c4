//! The account directory: a fixed set of users, looked up by identifier.

/// Length of an account identifier, in digits.
pub const ID_LENGTH: usize = 6;
/// Length of a password, in digits.
pub const PASSWORD_LENGTH: usize = 4;
/// Consecutive wrong passwords after which an account is blocked.
pub const MAX_FAILED_ATTEMPTS: u8 = 3;

/// A single user account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub id: String,
    pub password: String,
    pub name: String,
    /// Balance in whole pesos.
    pub balance: u64,
    pub failed_attempts: u8,
    /// Once set, the account can neither withdraw nor change its password. Only an administrator
    /// can clear it, which this controller doesn't do.
    pub blocked: bool,
}

impl Account {
    pub fn new(id: &str, password: &str, name: &str, balance: u64) -> Self {
        Account {
            id: id.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            balance,
            failed_attempts: 0,
            blocked: false,
        }
    }

    /// Registers a wrong password. Blocks the account once [MAX_FAILED_ATTEMPTS] is reached and
    /// returns how many attempts remain.
    pub fn register_failure(&mut self) -> u8 {
        self.failed_attempts = self.failed_attempts.saturating_add(1).min(MAX_FAILED_ATTEMPTS);
        if self.failed_attempts >= MAX_FAILED_ATTEMPTS {
            self.blocked = true;
        }
        MAX_FAILED_ATTEMPTS - self.failed_attempts
    }

    pub fn clear_failures(&mut self) {
        self.failed_attempts = 0;
    }
}

/// The static account directory.
#[derive(Clone, Debug)]
pub struct Directory {
    accounts: Vec<Account>,
}

impl Directory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Directory { accounts }
    }

    /// Finds the index of the account with the given identifier.
    pub fn find(&self, id: &str) -> Option<usize> {
        self.accounts.iter().position(|account| account.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Account> {
        self.accounts.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Directory::new(vec![
            Account::new("123456", "1234", "Juan Perez", 220_000),
            Account::new("234567", "2345", "Maria Garcia", 350_000),
            Account::new("345678", "3456", "Carlos Lopez", 10_000),
            Account::new("456789", "4567", "Ana Martinez", 200_000),
            Account::new("567890", "5678", "Pedro Sanchez", 100_000),
        ])
    }
}
