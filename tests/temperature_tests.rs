use pentair_senz::{HvacMode, Preset, Temperature};

#[test]
fn from_centi() {
    let t = Temperature::from_centi(2150);
    assert_eq!(t.celsius(), 21.5);
    assert_eq!(Temperature::from_centi(500).celsius(), 5.0);
    assert_eq!(Temperature::from_centi(-250).celsius(), -2.5);
}

#[test]
fn to_centi_rounds() {
    assert_eq!(Temperature::from_celsius(22.5).to_centi(), 2250);
    assert_eq!(Temperature::from_celsius(21.004).to_centi(), 2100);
    assert_eq!(Temperature::from_celsius(21.006).to_centi(), 2101);
}

#[test]
fn display() {
    let t = Temperature::from_celsius(22.5);
    assert_eq!(format!("{t}"), "22.5\u{00b0}C");
}

#[test]
fn hvac_mode_parse() {
    for mode in [
        HvacMode::Off,
        HvacMode::Heat,
        HvacMode::Cool,
        HvacMode::HeatCool,
        HvacMode::Auto,
        HvacMode::Dry,
        HvacMode::FanOnly,
    ] {
        assert_eq!(mode.as_str().parse::<HvacMode>().unwrap(), mode);
    }
    assert!("warm".parse::<HvacMode>().is_err());
}

#[test]
fn preset_parse() {
    assert_eq!("boost".parse::<Preset>().unwrap(), Preset::Boost);
    assert!("eco".parse::<Preset>().is_err());
}
