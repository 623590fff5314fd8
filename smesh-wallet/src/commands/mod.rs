//! Interactive Commands
//!
//! The [`Dispatcher`] reads one line at a time, matches it against an
//! ordered [`CommandTable`] and runs the handler to completion before
//! reading the next line. Matching is by prefix in registration order, so
//! a command registered earlier shadows a later one that extends it;
//! `set-rewards-account` is therefore registered ahead of `set`.

mod account;
mod node;
mod send;
mod smesher;

use std::io::{BufRead, Write};
use tracing::{debug, error, info};

use crate::backend::WalletBackend;
use crate::error::{Result, WalletError};
use crate::rpc::NodeApi;

/// Marks every line of command output
pub const PRINT_PREFIX: &str = ">";

/// Shown when waiting for a command
pub const PROMPT: &str = "$ ";

/// Unit name used when printing amounts
pub const COIN_UNIT: &str = "Smidge";

/// What a command line resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NewAccount,
    SetRewardsAccount,
    SelectAccount,
    AccountInfo,
    AllTransactions,
    SendCoin,
    SignHex,
    SignText,
    SmesherRewards,
    NodeInfo,
    AllAccounts,
    StartSmeshing,
    StopSmeshing,
    SmeshingStatus,
    GetRewardsAccount,
    GetSmesherId,
    Activations,
    Quit,
    Help,
}

/// A registered command
#[derive(Debug, Clone)]
pub struct Command {
    pub text: &'static str,
    pub description: &'static str,
    pub action: Action,
}

/// Commands in registration order
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: Vec<Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, text: &'static str, description: &'static str, action: Action) {
        self.commands.push(Command {
            text,
            description,
            action,
        });
    }

    /// First registered command whose text is a prefix of `input`
    pub fn lookup(&self, input: &str) -> Option<Action> {
        self.commands
            .iter()
            .find(|c| input.starts_with(c.text))
            .map(|c| c.action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The wallet's command set
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register(
            "new",
            "Create a new account (key pair) and set as current",
            Action::NewAccount,
        );
        table.register(
            "set-rewards-account",
            "Set current account as the node smesher's rewards account",
            Action::SetRewardsAccount,
        );
        table.register(
            "set",
            "Set one of the previously created accounts as current",
            Action::SelectAccount,
        );
        table.register("info", "Display the current account info", Action::AccountInfo);
        table.register(
            "all-txs",
            "List all transactions (outgoing and incoming) for the current account",
            Action::AllTransactions,
        );
        table.register(
            "send-coin",
            "Transfer coins from current account to another account",
            Action::SendCoin,
        );
        table.register(
            "sign",
            "Sign a hex message with the current account private key",
            Action::SignHex,
        );
        table.register(
            "textsign",
            "Sign a text message with the current account private key",
            Action::SignText,
        );
        table.register(
            "smesher-rewards",
            "List all rewards awarded to a smesher",
            Action::SmesherRewards,
        );
        table.register(
            "rewards",
            "Set current account as rewards account in the node",
            Action::SetRewardsAccount,
        );
        table.register("node", "Display node info and status", Action::NodeInfo);
        table.register("all", "Display all mesh accounts (debug)", Action::AllAccounts);
        table.register(
            "start",
            "Start smeshing with the current account as rewards account",
            Action::StartSmeshing,
        );
        table.register("stop", "Stop smeshing", Action::StopSmeshing);
        table.register("status", "Display smeshing status", Action::SmeshingStatus);
        table.register(
            "get-rewards-account",
            "Display the node smesher's rewards account",
            Action::GetRewardsAccount,
        );
        table.register(
            "get-smesher-id",
            "Display the node smesher's id",
            Action::GetSmesherId,
        );
        table.register(
            "activations",
            "List activations of the current account",
            Action::Activations,
        );
        table.register("quit", "Quit the wallet", Action::Quit);
        table.register("help", "List commands", Action::Help);
        table
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    AwaitingInput,
    Dispatching,
    Terminated,
}

/// Interactive command loop over a line source and an output sink.
pub struct Dispatcher<C: NodeApi, R: BufRead, W: Write> {
    backend: WalletBackend<C>,
    commands: CommandTable,
    input: R,
    output: W,
    state: DispatcherState,
}

impl<C: NodeApi, R: BufRead, W: Write> Dispatcher<C, R, W> {
    pub fn new(backend: WalletBackend<C>, input: R, output: W) -> Self {
        Self {
            backend,
            commands: CommandTable::standard(),
            input,
            output,
            state: DispatcherState::AwaitingInput,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn backend(&self) -> &WalletBackend<C> {
        &self.backend
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Handshake with the node.
    ///
    /// On failure the dispatcher is terminated and the error returned.
    pub async fn start(&mut self) -> Result<()> {
        if let Err(e) = self.backend.sanity().await {
            error!(
                "Failed to connect to node at {}: {}",
                self.backend.server_url(),
                e
            );
            self.state = DispatcherState::Terminated;
            return Err(e);
        }

        let url = self.backend.server_url().to_string();
        self.say(&format!("Welcome to Spacemesh. Connected to node at {}", url))?;
        Ok(())
    }

    /// Handshake, then process lines until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;
        while self.state != DispatcherState::Terminated {
            self.step().await?;
        }
        info!("Session ended");
        Ok(())
    }

    /// Read and process a single line.
    ///
    /// Handler failures are reported on the output and do not end the
    /// session; only failures to prompt or read the command line are
    /// returned.
    pub async fn step(&mut self) -> Result<()> {
        if self.state == DispatcherState::Terminated {
            return Ok(());
        }

        write!(self.output, "{}", PROMPT)?;
        self.output.flush()?;

        let line = match self.read_line()? {
            Some(line) => line,
            None => {
                self.state = DispatcherState::Terminated;
                return Ok(());
            }
        };

        let text = line.trim();
        if text.is_empty() {
            return Ok(());
        }

        let action = match self.commands.lookup(text) {
            Some(action) => action,
            None => return self.say("invalid command."),
        };

        debug!("Executing {:?} for input `{}`", action, text);
        self.state = DispatcherState::Dispatching;
        let result = self.execute(action).await;
        if self.state == DispatcherState::Dispatching {
            self.state = DispatcherState::AwaitingInput;
        }

        if let Err(e) = result {
            error!("Command {:?} failed: {}", action, e);
            self.print_error(&e.to_string())?;
        }
        Ok(())
    }

    async fn execute(&mut self, action: Action) -> Result<()> {
        match action {
            Action::NewAccount => self.create_account().map(|_| ()),
            Action::SelectAccount => self.choose_account(),
            Action::AccountInfo => self.account_info().await,
            Action::SignHex => self.sign_hex(),
            Action::SignText => self.sign_text(),
            Action::SendCoin => self.send_coin().await,
            Action::AllTransactions => self.mesh_transactions().await,
            Action::Activations => self.activations().await,
            Action::AllAccounts => self.debug_all_accounts().await,
            Action::NodeInfo => self.node_info().await,
            Action::SmesherRewards => self.smesher_rewards().await,
            Action::StartSmeshing => self.start_smeshing().await,
            Action::StopSmeshing => self.stop_smeshing().await,
            Action::SmeshingStatus => self.smeshing_status().await,
            Action::GetRewardsAccount => self.get_rewards_account().await,
            Action::SetRewardsAccount => self.set_rewards_account().await,
            Action::GetSmesherId => self.get_smesher_id().await,
            Action::Help => self.help(),
            Action::Quit => {
                self.state = DispatcherState::Terminated;
                Ok(())
            }
        }
    }

    fn help(&mut self) -> Result<()> {
        let lines: Vec<String> = self
            .commands
            .iter()
            .map(|c| format!("{:<20} {}", c.text, c.description))
            .collect();
        for line in lines {
            self.say(&line)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Input/output helpers
    // ------------------------------------------------------------------

    /// Write one prefixed output line
    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{} {}", PRINT_PREFIX, message)?;
        Ok(())
    }

    fn print_error(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{} Error: {}", PRINT_PREFIX, message)?;
        Ok(())
    }

    /// Next raw line, `None` at end of input
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask a question and return the trimmed answer
    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{} ", message)?;
        self.output.flush()?;

        self.read_line()?
            .map(|line| line.trim().to_string())
            .ok_or_else(|| WalletError::input("end of input"))
    }

    /// Ask until a non-blank answer is given
    fn prompt_not_blank(&mut self, message: &str) -> Result<String> {
        loop {
            let answer = self.prompt(message)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
        }
    }

    /// Ask until the answer is `y` or `n`
    fn prompt_yes_no(&mut self, message: &str) -> Result<bool> {
        loop {
            let answer = self.prompt(&format!("{} (y/n)", message))?;
            if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
                return Ok(true);
            }
            if answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no") {
                return Ok(false);
            }
        }
    }

    /// Ask for an unsigned integer
    fn prompt_u64(&mut self, message: &str) -> Result<u64> {
        let answer = self.prompt_not_blank(message)?;
        answer
            .parse()
            .map_err(|_| WalletError::input(format!("`{}` is not a whole number", answer)))
    }
}

/// Decode hex with an optional `0x` prefix
fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    hex::decode(digits).map_err(|e| WalletError::input(format!("invalid hex `{}`: {}", input, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_match() {
        let table = CommandTable::standard();

        assert_eq!(table.lookup("send-coin"), Some(Action::SendCoin));
        assert_eq!(table.lookup("send-coin extra-garbage"), Some(Action::SendCoin));
        assert_eq!(table.lookup("sendcoinnow"), None);
        assert_eq!(table.lookup("quit"), Some(Action::Quit));
        assert_eq!(table.lookup(""), None);
    }

    #[test]
    fn test_registration_order_decides_shadowing() {
        let table = CommandTable::standard();

        assert_eq!(table.lookup("set"), Some(Action::SelectAccount));
        assert_eq!(
            table.lookup("set-rewards-account"),
            Some(Action::SetRewardsAccount)
        );
        assert_eq!(table.lookup("all-txs"), Some(Action::AllTransactions));
        assert_eq!(table.lookup("all"), Some(Action::AllAccounts));
        assert_eq!(table.lookup("signature"), Some(Action::SignHex));
        assert_eq!(table.lookup("textsign"), Some(Action::SignText));
        assert_eq!(table.lookup("rewards"), Some(Action::SetRewardsAccount));
        assert_eq!(
            table.lookup("smesher-rewards"),
            Some(Action::SmesherRewards)
        );
    }

    #[test]
    fn test_first_registration_wins() {
        let mut table = CommandTable::new();
        table.register("go", "short", Action::Quit);
        table.register("gone", "long", Action::Help);

        assert_eq!(table.lookup("gone"), Some(Action::Quit));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let table = CommandTable::standard();
        assert_eq!(table.lookup("QUIT"), None);
        assert_eq!(table.lookup(" quit"), None);
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("0xdead").unwrap(), vec![0xde, 0xad]);
        assert_eq!(decode_hex("BEEF").unwrap(), vec![0xbe, 0xef]);
        assert!(matches!(decode_hex("xyz"), Err(WalletError::Input(_))));
        assert!(matches!(decode_hex("abc"), Err(WalletError::Input(_))));
    }
}
