//! The transaction state machine.
//!
//! [Controller] owns the account directory, the cash inventory and the session. Every key goes
//! through [Controller::handle_key], the stage deadline is checked by [Controller::poll], and both
//! return the side effects the run loop has to carry out. There's one transition method per
//! [State]; each returns the next state and pushes its effects.

use std::time::Instant;
use log::{debug, info};
use matecash_gpio::keypad::KeypadKey;
use crate::accounts::{Directory, ID_LENGTH, PASSWORD_LENGTH};
use crate::effects::{Effect, Effects};
use crate::error::TransactionError;
use crate::inventory::Inventory;
use crate::session::{FieldInput, Session, SessionTimer, State};
use crate::utils::{center_line, format_money};

const MENU_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

#[derive(Debug)]
pub struct Controller {
    directory: Directory,
    inventory: Inventory,
    session: Session,
    timer: SessionTimer,
}

impl Controller {
    pub fn new(directory: Directory, inventory: Inventory, timer: SessionTimer, now: Instant) -> Self {
        Controller {
            directory,
            inventory,
            session: Session::new(now),
            timer,
        }
    }

    /// Resets the session and draws the welcome screen.
    pub fn start(&mut self, now: Instant) -> Vec<Effect> {
        let mut fx = Effects::new();
        self.session.state = self.reset(now, "", &mut fx);
        fx.into_vec()
    }

    pub fn state(&self) -> &State {
        &self.session.state
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Feeds one accepted key into the state machine.
    ///
    /// If the current stage is already past its deadline, the session times out and the key is
    /// dropped.
    pub fn handle_key(&mut self, key: KeypadKey, now: Instant) -> Vec<Effect> {
        let mut fx = Effects::new();

        if self.timer.expired(&self.session, now) {
            debug!("Key dropped, the {} stage timed out.", self.session.state.name());
            self.time_out(now, &mut fx);
            return fx.into_vec();
        }

        let previous = std::mem::take(&mut self.session.state);
        let name = previous.name();
        let next = match previous {
            State::EnterId => self.enter_id(key, now, &mut fx),
            State::EnterPassword => self.enter_password(key, now, &mut fx),
            State::LoggedIn => self.logged_in(key, now, &mut fx),
            State::CheckBalance => self.check_balance(key, now, &mut fx),
            State::WithdrawMenu => self.withdraw_menu(key, now, &mut fx),
            State::ChangePassword => self.change_password(key, now, &mut fx),
            State::ConfirmPassword { pending } => self.confirm_password(pending, key, now, &mut fx),
        };

        if next.name() != name {
            info!("{} -> {}", name, next.name());
        }
        self.session.state = next;
        fx.into_vec()
    }

    /// Checks the stage deadline. Called once per poll cycle, whether a key arrived or not.
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        let mut fx = Effects::new();
        if self.timer.expired(&self.session, now) {
            self.time_out(now, &mut fx);
        }
        fx.into_vec()
    }

    fn time_out(&mut self, now: Instant, fx: &mut Effects) {
        info!("{} -> {} (timeout)", self.session.state.name(), State::EnterId.name());
        fx.fault(TransactionError::SessionTimeout);
        self.session.state = self.reset(now, "Time exceeded", fx);
    }

    /// Full reset: clears the session and shows the welcome screen with an optional notice.
    fn reset(&mut self, now: Instant, notice: &str, fx: &mut Effects) -> State {
        self.session.reset(now);
        fx.screen([
            &center_line("Welcome to MateCash"),
            notice,
            "Enter account #:",
            "",
        ]);
        State::EnterId
    }

    fn enter_id(&mut self, key: KeypadKey, now: Instant, fx: &mut Effects) -> State {
        match self.session.push_digit(key, ID_LENGTH) {
            FieldInput::Ignored => State::EnterId,
            FieldInput::Partial => {
                if self.session.input.len() == 1 {
                    // The identifier stage starts with its first digit, not with the welcome screen.
                    self.session.stage_started = now;
                }
                fx.line(3, &self.session.input);
                State::EnterId
            }
            FieldInput::Complete => {
                let id = self.session.take_input();
                let Some((index, account)) = self
                    .directory
                    .find(&id)
                    .and_then(|index| Some((index, self.directory.get(index)?)))
                else {
                    info!("Account {} does not exist.", id);
                    fx.fault(TransactionError::UnknownAccount);
                    return self.reset(now, "Unknown account", fx);
                };

                if account.blocked {
                    info!("Account {} is blocked.", id);
                    fx.fault(TransactionError::AccountBlocked);
                    return self.reset(now, "Account blocked", fx);
                }

                info!("Account {} found, asking for password.", id);
                let greeting = format!("Hello, {}", account.name);
                self.session.account = Some(index);
                self.session.restart_stage(now);
                fx.screen([&greeting, "", "Enter password:", ""]);
                State::EnterPassword
            }
        }
    }

    fn enter_password(&mut self, key: KeypadKey, now: Instant, fx: &mut Effects) -> State {
        let Some(index) = self.session.account else {
            return self.reset(now, "", fx);
        };

        match self.session.push_digit(key, PASSWORD_LENGTH) {
            FieldInput::Ignored => State::EnterPassword,
            FieldInput::Partial => {
                fx.line(3, &"*".repeat(self.session.input.len()));
                State::EnterPassword
            }
            FieldInput::Complete => {
                let attempt = self.session.take_input();
                let Some(account) = self.directory.get_mut(index) else {
                    return self.reset(now, "", fx);
                };

                if account.blocked {
                    fx.fault(TransactionError::AccountBlocked);
                    return self.reset(now, "Account blocked", fx);
                }

                if account.password == attempt {
                    account.clear_failures();
                    info!("Welcome, {}!", account.name);
                    self.show_menu(None, fx);
                    return State::LoggedIn;
                }

                let remaining = account.register_failure();
                if account.blocked {
                    info!("Account {} blocked after too many failed attempts.", account.id);
                    fx.fault(TransactionError::TooManyAttempts);
                    self.reset(now, "Too many attempts", fx)
                } else {
                    info!("Wrong password, {} attempts remaining.", remaining);
                    fx.fault(TransactionError::WrongPassword { remaining });
                    self.reset(now, &format!("Wrong pass, {} left", remaining), fx)
                }
            }
        }
    }

    fn logged_in(&mut self, key: KeypadKey, now: Instant, fx: &mut Effects) -> State {
        match key {
            KeypadKey::KeyA => {
                self.show_withdraw_menu(None, fx);
                State::WithdrawMenu
            }
            KeypadKey::KeyB => {
                info!("Checking balance.");
                self.show_balance(fx);
                State::CheckBalance
            }
            KeypadKey::KeyC => {
                self.session.restart_stage(now);
                fx.screen(["Change password", "", "Enter new password:", ""]);
                State::ChangePassword
            }
            KeypadKey::KeyD => {
                info!("Closing session.");
                self.reset(now, "Session closed", fx)
            }
            _ => {
                debug!("Invalid menu option {}.", key.to_char());
                self.show_menu(None, fx);
                State::LoggedIn
            }
        }
    }

    fn check_balance(&mut self, key: KeypadKey, now: Instant, fx: &mut Effects) -> State {
        if key == KeypadKey::KeyHash {
            info!("Thank you for using MateCash.");
            self.reset(now, "Thank you!", fx)
        } else {
            self.show_balance(fx);
            State::CheckBalance
        }
    }

    fn withdraw_menu(&mut self, key: KeypadKey, now: Instant, fx: &mut Effects) -> State {
        match key.menu_index() {
            Some(choice) if self.inventory.get(choice).is_some() => self.withdraw(choice, now, fx),
            _ => {
                debug!("Invalid amount option {}.", key.to_char());
                self.show_withdraw_menu(None, fx);
                State::WithdrawMenu
            }
        }
    }

    /// Withdraws one note of the denomination at `choice`. Every check runs before anything is
    /// mutated, so a failed withdrawal leaves balance and stock untouched.
    fn withdraw(&mut self, choice: usize, now: Instant, fx: &mut Effects) -> State {
        let Some(index) = self.session.account else {
            return self.reset(now, "", fx);
        };
        let (Some(account), Some(denomination)) =
            (self.directory.get(index), self.inventory.get(choice).copied())
        else {
            return self.reset(now, "", fx);
        };

        if account.blocked {
            fx.fault(TransactionError::AccountBlocked);
            return self.reset(now, "Account blocked", fx);
        }

        if !denomination.in_stock() {
            let face_value = denomination.face_value;
            fx.fault(TransactionError::OutOfStock { face_value });
            let notice = format!("Out of {}", format_money(face_value));
            self.show_withdraw_menu(Some(&notice), fx);
            return State::WithdrawMenu;
        }

        if denomination.face_value > account.balance {
            let balance = account.balance;
            fx.fault(TransactionError::InsufficientFunds { balance });
            self.show_withdraw_menu(Some("Insufficient funds"), fx);
            return State::WithdrawMenu;
        }

        let (Some(taken), Some(account)) =
            (self.inventory.take_note(choice), self.directory.get_mut(index))
        else {
            return self.reset(now, "", fx);
        };
        account.balance -= taken.face_value;
        info!(
            "Withdrew {}, new balance {}.",
            format_money(taken.face_value),
            format_money(account.balance),
        );

        fx.dispense(taken.pin);
        self.show_balance(fx);
        State::CheckBalance
    }

    fn change_password(&mut self, key: KeypadKey, now: Instant, fx: &mut Effects) -> State {
        match self.session.push_digit(key, PASSWORD_LENGTH) {
            FieldInput::Ignored => State::ChangePassword,
            FieldInput::Partial => {
                fx.line(3, &"*".repeat(self.session.input.len()));
                State::ChangePassword
            }
            FieldInput::Complete => {
                let pending = self.session.take_input();
                self.session.restart_stage(now);
                fx.screen(["Change password", "", "Confirm password:", ""]);
                State::ConfirmPassword { pending }
            }
        }
    }

    fn confirm_password(
        &mut self,
        pending: String,
        key: KeypadKey,
        now: Instant,
        fx: &mut Effects,
    ) -> State {
        match self.session.push_digit(key, PASSWORD_LENGTH) {
            FieldInput::Ignored => State::ConfirmPassword { pending },
            FieldInput::Partial => {
                fx.line(3, &"*".repeat(self.session.input.len()));
                State::ConfirmPassword { pending }
            }
            FieldInput::Complete => {
                let confirmation = self.session.take_input();
                let Some(account) = self.session.account.and_then(|i| self.directory.get_mut(i))
                else {
                    return self.reset(now, "", fx);
                };

                if account.blocked {
                    fx.fault(TransactionError::AccountBlocked);
                    return self.reset(now, "Account blocked", fx);
                }

                let notice = if confirmation == pending {
                    account.password = pending;
                    info!("Password changed for account {}.", account.id);
                    "Password changed"
                } else {
                    fx.fault(TransactionError::PasswordMismatch);
                    "Passwords differ"
                };
                self.show_menu(Some(notice), fx);
                State::LoggedIn
            }
        }
    }

    fn show_menu(&self, notice: Option<&str>, fx: &mut Effects) {
        let title = center_line("User menu");
        fx.screen([
            notice.unwrap_or(&title),
            "A-Withdraw B-Balance",
            "C-Change password",
            "D-Log out",
        ]);
    }

    fn show_withdraw_menu(&self, notice: Option<&str>, fx: &mut Effects) {
        let options: Vec<String> = self
            .inventory
            .iter()
            .zip(MENU_LETTERS)
            .map(|(denomination, letter)| {
                format!("{}-{}", letter, format_money(denomination.face_value))
            })
            .collect();
        let mut rows = options.chunks(2).map(|pair| pair.join(" "));
        let first = rows.next().unwrap_or_default();
        let second = rows.next().unwrap_or_default();

        match notice {
            Some(notice) => fx.screen([notice, "Choose another:", &first, &second]),
            None => fx.screen(["How much would you", "like to withdraw?", &first, &second]),
        }
    }

    fn show_balance(&self, fx: &mut Effects) {
        let balance = self
            .session
            .account
            .and_then(|index| self.directory.get(index))
            .map(|account| account.balance)
            .unwrap_or_default();
        info!("Current balance is {}.", format_money(balance));
        fx.screen([
            "Your balance is:",
            &format!("$ {}", format_money(balance)),
            "",
            "Press # to finish",
        ]);
    }
}
