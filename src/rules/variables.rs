//! The closed set of names a rule may reference.

use std::collections::BTreeSet;

/// Whether a variable holds one value per time step or a single scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// 168 hourly samples, read as `name[index]`.
    Series,
    /// A single value for the whole run, read as `name`.
    Scalar,
}

/// A variable exposed to rule fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    Pv,
    Load,
    Charge,
    Discharge,
    Purchase,
    FeedIn,
    Soc,
    WBatt,
    ElectricityPrice,
    Co2Emissions,
    WBattMax,
    FeedInTariff,
    Step,
}

impl Variable {
    /// Every variable in documentation order.
    pub const ALL: [Self; 13] = [
        Self::Pv,
        Self::Load,
        Self::Purchase,
        Self::FeedIn,
        Self::FeedInTariff,
        Self::ElectricityPrice,
        Self::Co2Emissions,
        Self::Charge,
        Self::Discharge,
        Self::WBatt,
        Self::WBattMax,
        Self::Soc,
        Self::Step,
    ];

    /// Name used in rule text.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pv => "P_pv",
            Self::Load => "P_load",
            Self::Charge => "P_charge",
            Self::Discharge => "P_discharge",
            Self::Purchase => "P_purchase",
            Self::FeedIn => "P_feed_in",
            Self::Soc => "SoC",
            Self::WBatt => "W_batt",
            Self::ElectricityPrice => "electricity_price_customer",
            Self::Co2Emissions => "CO2_emissions",
            Self::WBattMax => "W_batt_max",
            Self::FeedInTariff => "feed_in_tariff",
            Self::Step => "t",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    pub const fn kind(self) -> Kind {
        match self {
            Self::WBattMax | Self::FeedInTariff | Self::Step => Kind::Scalar,
            _ => Kind::Series,
        }
    }

    /// Only the four grid/battery flows may be assigned by actions.
    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            Self::Charge | Self::Discharge | Self::Purchase | Self::FeedIn
        )
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Pv => "PV generation power",
            Self::Load => "Household electricity demand",
            Self::Charge => "Battery charging power",
            Self::Discharge => "Battery discharging power",
            Self::Purchase => "Power purchased from the grid",
            Self::FeedIn => "Power fed into the grid",
            Self::Soc => "Battery state of charge",
            Self::WBatt => "Energy stored in the battery",
            Self::ElectricityPrice => "Customer electricity price",
            Self::Co2Emissions => "Specific CO2 emissions of grid electricity",
            Self::WBattMax => "Usable battery capacity",
            Self::FeedInTariff => "PV feed-in tariff",
            Self::Step => "Current hour of the week (0..=167)",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Pv | Self::Load | Self::Charge | Self::Discharge | Self::Purchase | Self::FeedIn => {
                "kW"
            }
            Self::Soc => "-",
            Self::WBatt | Self::WBattMax => "kWh",
            Self::ElectricityPrice | Self::FeedInTariff => "EUR/kWh",
            Self::Co2Emissions => "gCO2/kWh",
            Self::Step => "h",
        }
    }
}

/// Built-in functions callable from rule text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
}

impl Function {
    pub const ALL: [Self; 2] = [Self::Min, Self::Max];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub(crate) fn apply(self, args: &[f64]) -> f64 {
        let fold = match self {
            Self::Min => f64::min,
            Self::Max => f64::max,
        };
        args.iter().copied().reduce(fold).unwrap_or(f64::NAN)
    }
}

/// Set of identifier names a fragment is allowed to reference.
///
/// [`Whitelist::standard`] is the public contract of the rule language and
/// is never extended at runtime. Narrower whitelists can be built with
/// [`FromIterator`], but names outside the standard set can never be bound
/// to a value, so adding them only defers the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist(BTreeSet<String>);

impl Whitelist {
    pub fn standard() -> Self {
        Variable::ALL
            .iter()
            .map(|v| v.name())
            .chain(Function::ALL.iter().map(|f| f.name()))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the names in `names` that are not whitelisted, sorted.
    pub fn disallowed<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| !self.contains(name))
            .map(str::to_owned)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::standard()
    }
}

impl<S: Into<String>> FromIterator<S> for Whitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
