mod common;

mod parser {
    use crate::common;
    use eeprom_datalog::logger::DataLogger;
    use eeprom_datalog::parser::{Parser, Response, ResponseKind};
    use eeprom_datalog::sensor::Unit;
    use eeprom_datalog::Error;
    use pretty_assertions::assert_eq;

    type Logger = DataLogger<common::FakeRtc>;

    fn setup() -> (common::Eeprom, Logger) {
        let mut eeprom = common::Eeprom::zeroed();
        let mut logger = DataLogger::new(0, common::FakeRtc::default());
        logger.begin(&mut eeprom).unwrap();
        eeprom.clear_operations();
        (eeprom, logger)
    }

    fn eval(eeprom: &mut common::Eeprom, logger: &mut Logger, line: &str) -> (Response, String) {
        let mut out = String::new();
        let response = Parser::new(eeprom, logger).evaluate(line, &mut out).unwrap();
        (response, out)
    }

    fn kind(eeprom: &mut common::Eeprom, logger: &mut Logger, line: &str) -> ResponseKind {
        eval(eeprom, logger, line).0.kind
    }

    #[test]
    fn classification() {
        let (mut eeprom, mut logger) = setup();
        let cases = [
            ("", ResponseKind::MissingCommand),
            ("set t", ResponseKind::NotACommand),
            (" @set t 1 2", ResponseKind::NotACommand),
            ("@bogus", ResponseKind::InvalidCommand),
            ("@SET t 1 2", ResponseKind::InvalidCommand),
            ("@set", ResponseKind::MissingArgument),
            ("@set colour red", ResponseKind::InvalidArgument),
            ("@set t 10", ResponseKind::MissingValue),
            ("@set t", ResponseKind::MissingValue),
            ("@view", ResponseKind::MissingArgument),
            ("@view everything", ResponseKind::InvalidArgument),
            ("@wipe", ResponseKind::MissingArgument),
            ("@wipe all", ResponseKind::InvalidArgument),
            ("@read nothing", ResponseKind::InvalidArgument),
        ];
        for (line, expected) in cases {
            assert_eq!(kind(&mut eeprom, &mut logger, line), expected, "{line:?}");
        }
    }

    #[test]
    fn set_time_zone() {
        let (mut eeprom, mut logger) = setup();
        assert_eq!(eval(&mut eeprom, &mut logger, "@set zone 2:30").0, Response::ok(1));
        assert_eq!(logger.clock.time_zone(&mut eeprom).unwrap().quarters(), 10);

        assert_eq!(eval(&mut eeprom, &mut logger, "@s z -3:30").0, Response::ok(1));
        assert_eq!(logger.clock.time_zone(&mut eeprom).unwrap().quarters(), -14);

        assert_eq!(kind(&mut eeprom, &mut logger, "@s z 2"), ResponseKind::MissingValue);
        assert_eq!(kind(&mut eeprom, &mut logger, "@s z 16:00"), ResponseKind::InvalidValue);
        assert_eq!(kind(&mut eeprom, &mut logger, "@s z 1:60"), ResponseKind::InvalidValue);
        assert_eq!(kind(&mut eeprom, &mut logger, "@s z a:b"), ResponseKind::InvalidValue);
        assert_eq!(logger.clock.time_zone(&mut eeprom).unwrap().quarters(), -14);
    }

    #[test]
    fn set_temperature_in_any_unit() {
        let (mut eeprom, mut logger) = setup();
        assert_eq!(eval(&mut eeprom, &mut logger, "@set temperature 10 30.5").0, Response::ok(2));
        let threshold = logger.sensor.threshold(&mut eeprom).unwrap();
        assert_eq!((threshold.min.temperature, threshold.max.temperature), (1000, 3050));

        assert_eq!(eval(&mut eeprom, &mut logger, "@s temp 50 86 f").0, Response::ok(2));
        let threshold = logger.sensor.threshold(&mut eeprom).unwrap();
        assert_eq!((threshold.min.temperature, threshold.max.temperature), (1000, 3000));

        assert_eq!(eval(&mut eeprom, &mut logger, "@s t 273.15 300 Kelvin").0, Response::ok(2));
        let threshold = logger.sensor.threshold(&mut eeprom).unwrap();
        assert_eq!((threshold.min.temperature, threshold.max.temperature), (0, 2685));
        // the display unit is not touched
        assert_eq!(logger.sensor.unit(&mut eeprom).unwrap(), Unit::Celsius);
    }

    #[test]
    fn rejected_values_change_nothing() {
        let (mut eeprom, mut logger) = setup();
        eval(&mut eeprom, &mut logger, "@s t 10 30");
        let before = eeprom.buf.clone();
        eeprom.clear_operations();

        for line in [
            "@s t 30 10",
            "@s t 10 10",
            "@s t abc 30",
            "@s t 10 30 rankine",
            "@s h 50 40",
            "@s h 10 400",
            "@s l 10 101",
            "@s l -1 50",
            "@s a 900 100",
            "@s a 0 70000",
            "@s u rankine",
            "@s dt yesterday",
            "@s dt 2024-13-01T00:00:00",
            "@s dt 1960-01-01T00:00:00",
        ] {
            let got = kind(&mut eeprom, &mut logger, line);
            assert_eq!(got, ResponseKind::InvalidValue, "{line:?}");
        }
        assert!(eeprom.writes().is_empty());
        assert_eq!(eeprom.buf, before);
    }

    #[test]
    fn temperature_bounds_are_checked_in_celsius() {
        let (mut eeprom, mut logger) = setup();
        eval(&mut eeprom, &mut logger, "@s t 10 30");
        let before = eeprom.buf.clone();
        eeprom.clear_operations();

        for line in [
            // beyond the stored width once converted
            "@s t 1000 2000",
            "@s t 1 5000000 f",
            "@s t -21474836 0 k",
            "@s t 0 21474836.47 f",
            // 50 F and 50.01 F both truncate to 10.00 C
            "@s t 50 50.01 f",
        ] {
            let got = kind(&mut eeprom, &mut logger, line);
            assert_eq!(got, ResponseKind::InvalidValue, "{line:?}");
        }
        assert!(eeprom.writes().is_empty());
        assert_eq!(eeprom.buf, before);

        assert_eq!(eval(&mut eeprom, &mut logger, "@s t -327.68 327.67").0, Response::ok(2));
        let threshold = logger.sensor.threshold(&mut eeprom).unwrap();
        assert_eq!(
            (threshold.min.temperature, threshold.max.temperature),
            (i16::MIN, i16::MAX)
        );
    }

    #[test]
    fn set_humidity_luminosity_adjustment() {
        let (mut eeprom, mut logger) = setup();
        assert_eq!(eval(&mut eeprom, &mut logger, "@s hum 20 80.5").0, Response::ok(3));
        assert_eq!(eval(&mut eeprom, &mut logger, "@s ldr 10 90").0, Response::ok(4));
        assert_eq!(eval(&mut eeprom, &mut logger, "@s radj 100 900").0, Response::ok(5));

        let threshold = logger.sensor.threshold(&mut eeprom).unwrap();
        assert_eq!((threshold.min.humidity, threshold.max.humidity), (2000, 8050));
        let bounds = logger.ldr.threshold(&mut eeprom).unwrap();
        assert_eq!((bounds.min, bounds.max), (10, 90));
        let adjustment = logger.ldr.adjustment(&mut eeprom).unwrap();
        assert_eq!((adjustment.min, adjustment.max), (100, 900));
    }

    #[test]
    fn set_unit() {
        let (mut eeprom, mut logger) = setup();
        assert_eq!(eval(&mut eeprom, &mut logger, "@s u far").0, Response::ok(0));
        assert_eq!(logger.sensor.unit(&mut eeprom).unwrap(), Unit::Fahrenheit);
        assert_eq!(eval(&mut eeprom, &mut logger, "@s unit k").0, Response::ok(0));
        assert_eq!(logger.sensor.unit(&mut eeprom).unwrap(), Unit::Kelvin);
        assert_eq!(kind(&mut eeprom, &mut logger, "@s u"), ResponseKind::MissingValue);
    }

    #[test]
    fn set_datetime_uses_time_zone() {
        let (mut eeprom, mut logger) = setup();
        eval(&mut eeprom, &mut logger, "@s z 2:30");
        assert!(!logger.clock.is_adjusted(&mut eeprom).unwrap());

        assert_eq!(eval(&mut eeprom, &mut logger, "@s dt 2024-03-01T12:00:00").0, Response::ok(0));
        assert_eq!(logger.clock.rtc().unix, 1_709_294_400 - 9000);
        assert!(logger.clock.is_adjusted(&mut eeprom).unwrap());
        assert_eq!(logger.clock.unix_now(&mut eeprom).unwrap(), 1_709_294_400);
        assert_eq!(kind(&mut eeprom, &mut logger, "@s d"), ResponseKind::MissingValue);
    }

    #[test]
    fn view() {
        let (mut eeprom, mut logger) = setup();
        for line in ["@s t 10 30", "@s h 20 80.5", "@s l 10 90", "@s u f", "@s z -3:30"] {
            assert!(eval(&mut eeprom, &mut logger, line).0.is_ok());
        }

        let (response, out) = eval(&mut eeprom, &mut logger, "@view thresholds");
        assert_eq!(response, Response::ok(0));
        assert_eq!(
            out,
            "Temperature (F):\n    MIN: 50.00\n    MAX: 86.00\n\
             Humidity (%):\n    MIN: 20.00\n    MAX: 80.50\n\
             Luminosity (%):\n    MIN: 10\n    MAX: 90\n"
        );

        assert_eq!(eval(&mut eeprom, &mut logger, "@v z").1, "Timezone: -3:30\n");
        assert_eq!(
            eval(&mut eeprom, &mut logger, "@v a").1,
            "Adjustment (RAW):\n    MIN: 0\n    MAX: 1023\n"
        );
        assert_eq!(eval(&mut eeprom, &mut logger, "@v log").1, "");
    }

    #[test]
    fn view_log_oldest_first() {
        let (mut eeprom, mut logger) = setup();
        for (timestamp, temperature) in [(0u32, 2150i16), (60, -105)] {
            let log = eeprom_datalog::Log {
                timestamp,
                value: eeprom_datalog::Value {
                    temperature,
                    humidity: 5000,
                },
                luminosity: 3,
            };
            logger.log.record(&mut eeprom, &log).unwrap();
        }

        assert_eq!(
            eval(&mut eeprom, &mut logger, "@v l").1,
            "1970-01-01 00:00:00 | 21.50 C | 50.00 % | 3 %\n\
             1970-01-01 00:01:00 | -1.05 C | 50.00 % | 3 %\n"
        );
    }

    #[test]
    fn wipe() {
        let (mut eeprom, mut logger) = setup();
        logger.log.push(&mut eeprom, &eeprom_datalog::Log::default()).unwrap();
        eval(&mut eeprom, &mut logger, "@s z 1:00");

        assert_eq!(eval(&mut eeprom, &mut logger, "@w log").0, Response::ok(0));
        assert!(logger.log.is_empty());
        assert_eq!(logger.clock.time_zone(&mut eeprom).unwrap().quarters(), 4);

        assert_eq!(
            eval(&mut eeprom, &mut logger, "@wipe absolutelyeverything").0,
            Response::ok(-1)
        );
        assert!(eeprom.buf.iter().all(|&b| b == 0));

        logger.begin(&mut eeprom).unwrap();
        assert_eq!(logger.clock.time_zone(&mut eeprom).unwrap().quarters(), 0);
        assert!(logger.log.is_empty());
    }

    #[test]
    fn read_reset_calibrate() {
        let (mut eeprom, mut logger) = setup();
        let cases = [
            ("@reset", -1),
            ("@read", 6),
            ("@r sensors", 6),
            ("@r rawldr", 7),
            ("@calibrate", 0),
            ("@c", 0),
        ];
        for (line, id) in cases {
            assert_eq!(eval(&mut eeprom, &mut logger, line).0, Response::ok(id), "{line:?}");
        }
        assert!(eeprom.writes().is_empty());
    }

    #[test]
    fn storage_failure_is_an_error() {
        let (mut eeprom, mut logger) = setup();
        eeprom.fail_now();
        let mut out = String::new();
        let result = Parser::new(&mut eeprom, &mut logger).evaluate("@s z 1:00", &mut out);
        assert_eq!(result, Err(Error::StorageError));
    }
}
