use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use eeprom_datalog::console::LineReader;
use eeprom_datalog::logger::{DataLogger, Reading};
use eeprom_datalog::parser::{Outcome, Parser, Response};
use eeprom_datalog::platform::Hal;
use eeprom_datalog::sensor::{Fixed, Value};
use eeprom_datalog::ticks;

use crate::board::{SimBoard, SystemRtc, LDR_PIN};
use crate::error::Error;
use crate::image::Image;

/// Longest console line accepted, as on the device.
pub const LINE_CAPACITY: usize = 64;

/// A console session against an image file. Every evaluated line is written back to the file,
/// so the image always reflects what the device would have in its EEPROM.
pub struct Session<W> {
    path: PathBuf,
    image: Image,
    logger: DataLogger<SystemRtc>,
    board: SimBoard,
    value: Value,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn open<P: AsRef<Path>>(
        path: P,
        mut board: SimBoard,
        value: Value,
        out: W,
    ) -> Result<Self, Error> {
        let mut image = Image::load(&path)?;
        let mut logger = DataLogger::new(0, SystemRtc::default());
        logger.begin(&mut image)?;
        ticks::init(&mut board);

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            image,
            logger,
            board,
            value,
            out,
        })
    }

    /// Feeds `input` through the device's line reader and evaluates every complete line.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> Result<(), Error> {
        let mut reader = LineReader::<LINE_CAPACITY>::new();
        loop {
            let chunk = input.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            let len = chunk.len();
            for &byte in chunk {
                if let Some(line) = reader.push(byte) {
                    self.line(line)?;
                }
            }
            input.consume(len);
        }
        Ok(())
    }

    /// Evaluates one line, acts on its outcome and persists the image.
    pub fn line(&mut self, line: &str) -> Result<Response, Error> {
        let mut text = String::new();
        let response = Parser::new(&mut self.image, &mut self.logger).evaluate(line, &mut text)?;
        self.out.write_all(text.as_bytes())?;

        match self.logger.apply(&mut self.image, response)? {
            Some(Outcome::ReadSensors) => {
                let unit = self.logger.sensor.unit(&mut self.image)?;
                let raw = self.board.analog_read(LDR_PIN);
                let luminosity = self.logger.ldr.percent(&mut self.image, raw)?;
                writeln!(
                    self.out,
                    "Temperature: {} {}, Humidity: {} %, Luminosity: {} %",
                    Fixed(unit.from_celsius(self.value.temperature)),
                    unit,
                    Fixed(self.value.humidity as i32),
                    luminosity
                )?;
            }
            Some(Outcome::ReadRawLdr) => {
                writeln!(self.out, "LDR: {}", self.board.analog_read(LDR_PIN))?;
            }
            Some(Outcome::Reset) => {
                writeln!(self.out, "Restarting...")?;
                self.logger.begin(&mut self.image)?;
            }
            _ if !response.is_ok() => writeln!(self.out, "{response}")?,
            _ => {}
        }

        let reading = Reading {
            value: self.value,
            ldr_raw: self.board.analog_read(LDR_PIN),
        };
        self.logger.sample(&mut self.image, ticks::millis(), reading)?;

        self.image.save(&self.path)?;
        Ok(response)
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

/// Writes a blank image to `path`. Refuses to overwrite unless `force` is set.
pub fn format<P: AsRef<Path>>(path: P, force: bool) -> Result<(), Error> {
    let path = path.as_ref();
    if path.exists() && !force {
        return Err(Error::ImageExists(path.to_path_buf()));
    }
    Image::blank().save(path)
}

/// Prints the log stored in `path` without modifying the file.
pub fn dump<P: AsRef<Path>, W: Write>(path: P, out: &mut W) -> Result<usize, Error> {
    let mut image = Image::load(path)?;
    let mut logger = DataLogger::new(0, SystemRtc::default());
    logger.begin(&mut image)?;

    let mut text = String::new();
    Parser::new(&mut image, &mut logger).evaluate("@view log", &mut text)?;
    out.write_all(text.as_bytes())?;
    Ok(logger.log.len())
}
