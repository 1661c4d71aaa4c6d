use flashcard_core::{Grade, Handled, LeitnerBox, ReviewEvent, ReviewState, StoreError};

use crate::cli::SerialCli;
use crate::input::Button;
use crate::FirmwareApp;

fn hex_digit(value: u8) -> char {
    match value & 0x0f {
        0..=9 => (b'0' + (value & 0x0f)) as char,
        v => (b'a' + (v - 10)) as char,
    }
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|b| [hex_digit(b >> 4), hex_digit(*b)])
        .collect()
}

fn from_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| Some((hex_value(pair[0])? << 4) | hex_value(pair[1])?))
        .collect()
}

fn report_store_error<E: core::fmt::Debug>(cli: &SerialCli, err: StoreError<E>) {
    log::warn!("CLI: store error: {:?}", err);
    cli.write_line(&format!("ERR {:?}", err));
}

fn send_event(cli: &SerialCli, app: &mut FirmwareApp, event: ReviewEvent, today: u32) {
    match app.dispatch(event, today) {
        Ok(Handled::Consumed) => cli.write_line(&format!(
            "OK {}",
            app.session().state().label()
        )),
        Ok(Handled::Ignored) => cli.write_line(&format!(
            "ERR {} ignored in {}",
            event.label(),
            app.session().state().label()
        )),
        Err(err) => report_store_error(cli, err),
    }
}

fn reply_after_restart(cli: &SerialCli, app: &FirmwareApp) {
    if app.session().state() == ReviewState::Error {
        cli.write_line("OK (send recover to leave the error screen)");
    } else {
        cli.write_line("OK");
    }
}

pub fn handle_cli_command(
    line: &str,
    cli: &SerialCli,
    app: &mut FirmwareApp,
    today: u32,
    sleep_requested: &mut bool,
    injected_button: &mut Option<Button>,
) {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or("");

    match cmd {
        "help" => {
            cli.write_line("Commands: help, status, reveal, good, bad, info, dismiss, recover");
            cli.write_line("          export, restore <hex>, reset, redraw, sleep");
            cli.write_line("          btn <menu|back|up|down>");
            cli.write_line("OK");
        }
        "status" => {
            let stats = app.stats(today);
            cli.write_line(&format!(
                "state {} card {} today {}",
                app.session().state().label(),
                app.session()
                    .current_index()
                    .map_or_else(|| "-".to_string(), |index| index.to_string()),
                today
            ));
            cli.write_line(&format!(
                "cards {} due {} reviewed {}",
                stats.total,
                stats.due,
                app.session().reviewed()
            ));
            for leitner_box in LeitnerBox::ALL {
                cli.write_line(&format!(
                    "box {} {}",
                    leitner_box.label(),
                    stats.in_box(leitner_box)
                ));
            }
            cli.write_line(&format!(
                "namespace {} full refresh every {} reviews",
                app.config().namespace,
                app.config().full_refresh_threshold
            ));
            cli.write_line(&format!("frames {}", app.surface().frames()));
            cli.write_line("OK");
        }
        "reveal" => send_event(cli, app, ReviewEvent::Reveal, today),
        "good" => send_event(cli, app, ReviewEvent::Grade(Grade::Correct), today),
        "bad" => send_event(cli, app, ReviewEvent::Grade(Grade::Incorrect), today),
        "info" => send_event(cli, app, ReviewEvent::RequestInfo, today),
        "dismiss" => send_event(cli, app, ReviewEvent::Dismiss, today),
        "recover" => send_event(cli, app, ReviewEvent::Recover, today),
        "export" => {
            cli.write_line(&to_hex(&app.export()));
            cli.write_line("OK");
        }
        "restore" => {
            let Some(hex) = parts.next() else {
                cli.write_line("ERR missing snapshot");
                return;
            };
            let Some(blob) = from_hex(hex) else {
                cli.write_line("ERR snapshot must be hex");
                return;
            };
            match app.restore(&blob, today) {
                Ok(()) => reply_after_restart(cli, app),
                Err(err) => report_store_error(cli, err),
            }
        }
        "reset" => match app.reset(today) {
            Ok(()) => reply_after_restart(cli, app),
            Err(err) => report_store_error(cli, err),
        },
        "redraw" => {
            if let Err(err) = app.redraw(today) {
                log::warn!("CLI: redraw failed: {:?}", err);
            }
            cli.write_line("OK");
        }
        "sleep" => {
            cli.write_line("OK sleeping");
            *sleep_requested = true;
        }
        "btn" => {
            let Some(name) = parts.next() else {
                cli.write_line("ERR missing button");
                return;
            };
            let Some(btn) = Button::parse(name) else {
                cli.write_line("ERR button must be menu|back|up|down");
                return;
            };
            *injected_button = Some(btn);
            cli.write_line("OK");
        }
        "" => {}
        other => cli.write_line(&format!("ERR unknown command {} (try help)", other)),
    }
}
