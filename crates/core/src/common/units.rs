//! Byte units and human-readable size formatting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit a partition size is entered or displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteUnit {
    /// Single bytes.
    #[serde(rename = "bytes")]
    Bytes,
    /// Kibibytes (1024 bytes).
    #[default]
    #[serde(rename = "KB")]
    Kb,
    /// Mebibytes (1024 * 1024 bytes).
    #[serde(rename = "MB")]
    Mb,
}

impl ByteUnit {
    /// All units, smallest first.
    pub const ALL: [Self; 3] = [Self::Bytes, Self::Kb, Self::Mb];

    /// Number of bytes in one of this unit.
    pub const fn factor(self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kb => 1024,
            Self::Mb => 1024 * 1024,
        }
    }

    /// Parses the persisted spelling (`bytes`, `KB`, `MB`); anything else is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.label() == label)
    }

    /// Persisted spelling of this unit.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::Kb => "KB",
            Self::Mb => "MB",
        }
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Converts `value` between units by ratio. No rounding is applied.
pub fn convert_units(value: f64, from: ByteUnit, to: ByteUnit) -> f64 {
    value * from.factor() as f64 / to.factor() as f64
}

/// Integers print bare, everything else with two decimals.
fn float_or_int(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Formats `available/total` in the largest unit that keeps `total` below 1024.
///
/// With `whole_numbers` both sides are rounded to integers.
pub fn format_total_and_available(total: u64, available: u64, whole_numbers: bool) -> String {
    let render = |avail: f64, tot: f64, unit: &str| {
        if whole_numbers {
            format!("{}/{} {unit}", avail.round(), tot.round())
        } else {
            format!("{}/{} {unit}", float_or_int(avail), float_or_int(tot))
        }
    };

    if total < 1024 {
        return format!("{available}/{total} B");
    }

    let total_kb = total as f64 / 1024.0;
    let available_kb = available as f64 / 1024.0;
    if total_kb < 1024.0 {
        return render(available_kb, total_kb, "KB");
    }

    let total_mb = total_kb / 1024.0;
    let available_mb = available_kb / 1024.0;
    if total_mb < 1024.0 {
        return render(available_mb, total_mb, "MB");
    }

    let total_gb = total_mb / 1024.0;
    let available_gb = available_mb / 1024.0;
    if total_gb < 1024.0 {
        return render(available_gb, total_gb, "GB");
    }

    format!(
        "{}/{} B",
        float_or_int(available as f64),
        float_or_int(total as f64)
    )
}

/// Formats a byte count as `B`, `KB` or `MB`.
pub fn format_bytes(value: u64, whole_kb: bool) -> String {
    let v = value as f64;
    if value >= 1024 * 1024 {
        return format!("{} MB", float_or_int(v / (1024.0 * 1024.0)));
    }
    if value >= 1024 {
        if whole_kb {
            return format!("{} KB", (v / 1024.0).round());
        }
        return format!("{} KB", float_or_int(v / 1024.0));
    }
    format!("{value} B")
}

/// Human label for a block's minimum alignment, e.g. `8 KB` or `500 Bytes`.
pub fn min_alignment_label(alignment: u64) -> String {
    if alignment % 1024 == 0 {
        format!("{} KB", alignment / 1024)
    } else {
        format!("{alignment} Bytes")
    }
}

/// Largest unit that divides `size` exactly.
pub const fn clean_divisible_unit(size: u64) -> ByteUnit {
    if size % (1024 * 1024) == 0 {
        ByteUnit::Mb
    } else if size % 1024 == 0 {
        ByteUnit::Kb
    } else {
        ByteUnit::Bytes
    }
}

/// Increment for a size stepper shown in `unit` for a block with `min_alignment`.
pub fn size_step(min_alignment: Option<u64>, unit: ByteUnit) -> f64 {
    match min_alignment {
        Some(alignment) if alignment > unit.factor() => alignment as f64 / unit.factor() as f64,
        _ => 1.0,
    }
}
