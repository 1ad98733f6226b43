//! Line-oriented front end over the store.

use keylens_core::{KeyListItem, RedisBuffer};
use keylens_state::Store;
use keylens_state::browser::keys::{self, KeysAction};
use keylens_state::cli::{output, settings};
use keylens_state::notifications::NotificationsAction;
use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const HELP: &str = "\
keys [pattern]     scan keys matching pattern
more               load the next page
info <key>         show type, ttl and size of a key
del <key>          delete a key
cli <command...>   run a command through the CLI session
notifications      show and clear pending notifications
quit               close the CLI session and exit";

enum Command<'a> {
    Keys(&'a str),
    More,
    Info(&'a str),
    Delete(&'a str),
    Cli(&'a str),
    Notifications,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Command<'_>, String> {
    let line = line.trim();
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match name {
        "keys" => Ok(Command::Keys(rest)),
        "more" => Ok(Command::More),
        "info" if !rest.is_empty() => Ok(Command::Info(rest)),
        "del" if !rest.is_empty() => Ok(Command::Delete(rest)),
        "cli" if !rest.is_empty() => Ok(Command::Cli(rest)),
        "info" | "del" | "cli" => Err(format!("{name} needs an argument")),
        "notifications" => Ok(Command::Notifications),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other} (try help)")),
    }
}

/// Reads commands from stdin until `quit` or end of input. Returns the exit code.
pub async fn run(store: &Store) -> i32 {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if stdout.write_all(b"keylens> ").await.is_err() || stdout.flush().await.is_err() {
            return 1;
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Failed to read input: {e}");
                return 1;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(store, command).await,
            Err(message) => eprintln!("{message}"),
        }
        print_errors(store);
    }

    if let Err(e) = settings::reset_cli_settings(store).await {
        debug!("CLI session was not closed: {}", e);
    }
    0
}

async fn execute(store: &Store, command: Command<'_>) {
    match command {
        Command::Keys(pattern) => {
            let pattern = if pattern.is_empty() { "*" } else { pattern };
            store.dispatch(KeysAction::SetSearchMatch(pattern.to_string()));
            if keys::fetch_keys(store, "0", store.config().scan_count_default).await.is_ok() {
                print_page(store);
            }
        }
        Command::More => {
            let (loaded, cursor) = store.select(|state| {
                let page = &state.browser.keys.data;
                (page.keys.clone(), page.next_cursor.clone())
            });
            if cursor == "0" || cursor.is_empty() {
                println!("(no more keys)");
                return;
            }
            let count = store.config().scan_count_default;
            if keys::fetch_more_keys(store, loaded, &cursor, count).await.is_ok() {
                print_page(store);
            }
        }
        Command::Info(name) => {
            if let Ok(info) = keys::fetch_key_info(store, &RedisBuffer::from(name), true).await {
                println!("name:   {}", info.name);
                println!("type:   {}", info.key_type.as_str());
                println!("ttl:    {}", info.ttl);
                if let Some(size) = info.size {
                    println!("size:   {size}");
                }
                if let Some(length) = info.length {
                    println!("length: {length}");
                }
            }
        }
        Command::Delete(name) => {
            let _ = keys::delete_key_action(store, &RedisBuffer::from(name)).await;
            print_messages(store);
        }
        Command::Cli(command) => run_cli(store, command).await,
        Command::Notifications => print_messages(store),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

async fn run_cli(store: &Store, command: &str) {
    let uuid = store.select(|state| state.cli.settings.cli_client_uuid.clone());
    if uuid.is_empty() && settings::create_cli_client(store).await.is_err() {
        return;
    }

    let seen = store.select(|state| state.cli.output.data.len());
    output::update_cli_history(store, command);
    let _ = output::send_cli_command(store, command).await;

    let lines = store.select(|state| {
        state.cli.output.data.get(seen..).map(<[String]>::to_vec).unwrap_or_default()
    });
    for line in lines {
        println!("{line}");
    }
}

fn print_page(store: &Store) {
    let (keys, total, scanned) = store.select(|state| {
        let page = &state.browser.keys.data;
        (page.keys.clone(), page.total, page.scanned)
    });

    for item in &keys {
        println!("{}", describe(item));
    }
    println!("({} shown, {} scanned of {})", keys.len(), scanned, total);
}

fn describe(item: &KeyListItem) -> String {
    match item.key_type {
        Some(key_type) => format!("{:<8} {}", key_type.as_str(), item.name),
        None => format!("{:<8} {}", "", item.name),
    }
}

fn print_errors(store: &Store) {
    let errors = store.select(|state| state.app.notifications.errors.clone());
    if errors.is_empty() {
        return;
    }
    for error in &errors {
        eprintln!("error: {}", error.message);
    }
    store.dispatch(NotificationsAction::ResetErrors);
}

fn print_messages(store: &Store) {
    let messages = store.select(|state| state.app.notifications.messages.clone());
    for message in &messages {
        println!("{}: {}", message.title, message.message);
    }
    if !messages.is_empty() {
        store.dispatch(NotificationsAction::ResetMessages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_take_the_rest_of_the_line() {
        assert!(matches!(parse("keys user:*"), Ok(Command::Keys("user:*"))));
        assert!(matches!(parse("keys"), Ok(Command::Keys(""))));
        assert!(matches!(parse("cli  hgetall  h "), Ok(Command::Cli("hgetall  h"))));
        assert!(matches!(parse("quit"), Ok(Command::Quit)));
    }

    #[test]
    fn arguments_are_required() {
        assert!(parse("info").is_err());
        assert!(parse("del   ").is_err());
        assert!(parse("flushall").is_err());
    }
}
