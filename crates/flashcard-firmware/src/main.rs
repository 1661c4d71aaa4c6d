mod buffered_display;
mod cli;
mod cli_commands;
mod input;
mod nvs_store;

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use esp_idf_svc::hal::{delay::FreeRtos, gpio::IOPin, peripherals::Peripherals};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys;

use flashcard_core::{Deck, DeckStore, Handled, IdleTimer, StudyApp, StudyConfig};

use buffered_display::FrameSurface;
use cli::SerialCli;
use input::{Button, Buttons};
use nvs_store::NvsStore;

pub type FirmwareApp = StudyApp<NvsStore, FrameSurface>;

/// Deck compiled into the image, one `index;front;back` record per line
const CARDS: &str = include_str!("../cards.txt");
const POLL_INTERVAL_MS: u32 = 50;
const SECONDS_PER_DAY: u64 = 86_400;

/// Whole days since the Unix epoch, from the RTC wall clock
fn today() -> u32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    u32::try_from(secs / SECONDS_PER_DAY).unwrap_or(u32::MAX)
}

fn uptime_ms(boot: Instant) -> u64 {
    u64::try_from(boot.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Log heap usage statistics
fn log_heap(label: &str) {
    let free_heap = unsafe { sys::esp_get_free_heap_size() };
    let min_free = unsafe { sys::esp_get_minimum_free_heap_size() };
    log::info!(
        "[HEAP] {}: free={} bytes min_free={} bytes",
        label,
        free_heap,
        min_free
    );
}

fn redraw(app: &mut FirmwareApp, today: u32) {
    if let Err(err) = app.redraw(today) {
        log::warn!("UI: redraw failed: {:?}", err);
    }
}

fn press(app: &mut FirmwareApp, button: Button, today: u32) {
    let state = app.session().state();
    let Some(event) = input::event_for(button, state) else {
        log::info!("Button {:?} unused on {}", button, state.label());
        return;
    };
    match app.dispatch(event, today) {
        Ok(Handled::Consumed) => {}
        Ok(Handled::Ignored) => log::info!("Button {:?}: {} ignored", button, event.label()),
        Err(err) => log::warn!("Button {:?}: grade not saved: {}", button, err),
    }
}

fn enter_deep_sleep(wake_pin: i32) {
    log::info!("Entering deep sleep...");
    unsafe {
        sys::esp_sleep_enable_ext0_wakeup(wake_pin, 1);
        sys::esp_deep_sleep_start();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log_heap("startup");

    let peripherals = Peripherals::take()?;
    let partition = EspDefaultNvsPartition::take()?;
    let pins = peripherals.pins;

    let mut buttons = Buttons::new(
        pins.gpio26.downgrade(),
        pins.gpio25.downgrade(),
        pins.gpio32.downgrade(),
        pins.gpio4.downgrade(),
    )?;
    let mut cli = SerialCli::new(
        peripherals.uart0,
        pins.gpio1.downgrade(),
        pins.gpio3.downgrade(),
    )?;

    let config = StudyConfig::default();
    let (deck, report) = Deck::import(CARDS);
    if report.skipped() > 0 || report.truncated() {
        log::warn!(
            "Deck: {} lines skipped, {} dropped over capacity",
            report.skipped(),
            report.overflow
        );
    }

    let store = DeckStore::new(NvsStore::new(partition), config.namespace.clone());
    let surface = FrameSurface::new(config.max_text_width);
    let boot = Instant::now();
    let mut idle = IdleTimer::new(config.deep_sleep_timeout_ms, 0);
    let mut app: FirmwareApp = StudyApp::start(deck, store, surface, config, today())?;
    log_heap("after_load");

    log::info!("Starting review loop. MENU reveals, UP/DOWN grade, BACK shows info");
    log::info!("CLI: connect to UART0 @ 115200 (type 'help')");

    loop {
        let day = today();
        let now_ms = uptime_ms(boot);
        let mut sleep_requested = false;
        let mut injected_button = None;

        if let Some(line) = cli.poll_line() {
            idle.touch(now_ms);
            cli_commands::handle_cli_command(
                &line,
                &cli,
                &mut app,
                day,
                &mut sleep_requested,
                &mut injected_button,
            );
        }

        if let Some(button) = buttons.poll().or(injected_button) {
            log::info!("Button pressed: {:?}", button);
            idle.touch(now_ms);
            press(&mut app, button, day);
        }

        if app.tick(day) {
            redraw(&mut app, day);
        }

        if sleep_requested || idle.should_sleep(now_ms) {
            // MENU still held would wake the watch straight away
            while buttons.pressed() == Some(Button::Menu) {
                FreeRtos::delay_ms(POLL_INTERVAL_MS);
            }
            enter_deep_sleep(Button::Menu.gpio());
        }

        FreeRtos::delay_ms(POLL_INTERVAL_MS);
    }
}
