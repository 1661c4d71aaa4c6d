use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{config::Config, Uart, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

const MAX_LINE: usize = 1024;

/// Line based command console on the UART0 serial port
pub struct SerialCli<'d> {
    uart: UartDriver<'d>,
    buffer: Vec<u8>,
}

impl<'d> SerialCli<'d> {
    pub fn new<U: Uart>(
        uart: impl Peripheral<P = U> + 'd,
        tx: AnyIOPin,
        rx: AnyIOPin,
    ) -> Result<Self, EspError> {
        let config = Config::default().baudrate(Hertz(115_200));
        let uart = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        Ok(Self {
            uart,
            buffer: Vec::new(),
        })
    }

    /// Next complete line, if one has arrived. Never blocks.
    pub fn poll_line(&mut self) -> Option<String> {
        let mut temp = [0u8; 64];
        let read = match self.uart.read(&mut temp, NON_BLOCK) {
            Ok(read) if read > 0 => read,
            _ => return None,
        };

        for &b in &temp[..read] {
            match b {
                b'\n' => {
                    let line = String::from_utf8_lossy(&self.buffer)
                        .chars()
                        .filter(|ch| !ch.is_control())
                        .collect::<String>()
                        .trim()
                        .to_string();
                    self.buffer.clear();
                    if line.is_empty() {
                        return None;
                    }
                    return Some(line);
                }
                b'\r' => {}
                _ => {
                    self.buffer.push(b);
                    if self.buffer.len() > MAX_LINE {
                        self.buffer.clear();
                    }
                }
            }
        }

        None
    }

    pub fn write_str(&self, text: &str) {
        if let Err(err) = self.uart.write(text.as_bytes()) {
            log::warn!("CLI: write failed: {}", err);
        }
    }

    pub fn write_line(&self, text: &str) {
        self.write_str(text);
        self.write_str("\r\n");
    }
}
