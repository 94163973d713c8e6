//! Parameter table of the demo plugin: output gain and stereo pan.

/// Output gain in decibels.
pub const PARAM_GAIN: u32 = 0;
/// Stereo pan, `-1` (left) to `1` (right).
pub const PARAM_PAN: u32 = 1;

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// CLAP parameter id.
    pub id: u32,
    /// Display name.
    pub name: &'static str,
    /// Module path shown by hosts that group parameters.
    pub module: &'static str,
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// Value after instantiation.
    pub default: f32,
}

/// Every parameter, indexed by id.
pub const PARAMS: [ParamSpec; 2] = [
    ParamSpec {
        id: PARAM_GAIN,
        name: "Gain",
        module: "Output",
        min: -60.0,
        max: 12.0,
        default: 0.0,
    },
    ParamSpec {
        id: PARAM_PAN,
        name: "Pan",
        module: "Output",
        min: -1.0,
        max: 1.0,
        default: 0.0,
    },
];

/// Number of parameters.
pub const PARAM_COUNT: usize = PARAMS.len();

/// Look up a parameter by id.
pub fn param_info(id: u32) -> Option<&'static ParamSpec> {
    PARAMS.get(id as usize)
}

impl ParamSpec {
    /// Clamp `value` into range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Host-facing text for `value`.
    pub fn format(&self, value: f32) -> String {
        match self.id {
            PARAM_GAIN if value <= self.min => "-inf dB".to_owned(),
            PARAM_GAIN => format!("{value:.1} dB"),
            PARAM_PAN => format_pan(value),
            _ => format!("{value:.2}"),
        }
    }

    /// Parse user-entered text. Accepts what [`format`](Self::format) produces
    /// as well as bare numbers. The result is clamped.
    pub fn parse(&self, text: &str) -> Option<f32> {
        let text = text.trim();
        let value = match self.id {
            PARAM_GAIN => parse_gain(text)?,
            PARAM_PAN => parse_pan(text)?,
            _ => text.parse().ok()?,
        };
        Some(self.clamp(value))
    }
}

fn format_pan(value: f32) -> String {
    let percent = (value * 100.0).round();
    if percent == 0.0 {
        "C".to_owned()
    } else if percent < 0.0 {
        format!("L{}", -percent)
    } else {
        format!("R{percent}")
    }
}

fn parse_gain(text: &str) -> Option<f32> {
    let number = text
        .strip_suffix("dB")
        .or_else(|| text.strip_suffix("db"))
        .unwrap_or(text)
        .trim();
    if number == "-inf" {
        return Some(f32::NEG_INFINITY);
    }
    number.parse().ok()
}

fn parse_pan(text: &str) -> Option<f32> {
    let upper = text.to_ascii_uppercase();
    if upper == "C" {
        return Some(0.0);
    }
    if let Some(rest) = upper.strip_prefix('L') {
        return rest.trim().parse::<f32>().ok().map(|p| -p / 100.0);
    }
    if let Some(rest) = upper.strip_prefix('R') {
        return rest.trim().parse::<f32>().ok().map(|p| p / 100.0);
    }
    upper.parse().ok()
}

/// Linear amplitude for a gain in dB. The bottom of the range is silence.
pub fn db_to_amplitude(db: f32) -> f32 {
    if db <= PARAMS[PARAM_GAIN as usize].min {
        0.0
    } else {
        10f32.powf(db / 20.0)
    }
}

/// Equal-power `(left, right)` gains for a pan position.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (angle.cos(), angle.sin())
}
