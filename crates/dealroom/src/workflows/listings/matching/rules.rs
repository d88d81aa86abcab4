use super::super::domain::{same_label, BuyerPreferences, Listing};
use super::{MatchComponent, MatchFactor};

/// Band around a buyer range earning half credit, as (numerator, denominator) of the bound.
const PRICE_TOLERANCE: (u128, u128) = (10, 100);
const REVENUE_TOLERANCE: (u128, u128) = (20, 100);

enum RangeFit {
    Inside,
    WithinTolerance,
    Outside,
}

pub(crate) fn score_components(
    listing: &Listing,
    preferences: &BuyerPreferences,
) -> Vec<MatchComponent> {
    vec![
        region_component(listing, preferences),
        industry_component(listing, preferences),
        price_component(listing, preferences),
        revenue_component(listing, preferences),
    ]
}

fn region_component(listing: &Listing, preferences: &BuyerPreferences) -> MatchComponent {
    let factor = MatchFactor::Region;
    let region = listing.region.as_deref();
    if preferences.preferred_regions.accepts(region) {
        MatchComponent {
            factor,
            points: factor.weight(),
            notes: format!("region {} accepted", region.unwrap_or("any")),
        }
    } else {
        MatchComponent {
            factor,
            points: 0,
            notes: format!("region {} not preferred", region.unwrap_or("unknown")),
        }
    }
}

fn industry_component(listing: &Listing, preferences: &BuyerPreferences) -> MatchComponent {
    let factor = MatchFactor::Industry;
    match listing.industry.as_deref() {
        Some(industry)
            if preferences
                .preferred_industries
                .iter()
                .any(|preferred| same_label(preferred, industry)) =>
        {
            MatchComponent {
                factor,
                points: factor.weight(),
                notes: format!("industry {industry} preferred"),
            }
        }
        industry => MatchComponent {
            factor,
            points: 0,
            notes: format!("industry {} not preferred", industry.unwrap_or("unknown")),
        },
    }
}

fn price_component(listing: &Listing, preferences: &BuyerPreferences) -> MatchComponent {
    let factor = MatchFactor::Price;
    let Some(midpoint) = listing.price_midpoint() else {
        return MatchComponent {
            factor,
            points: 0,
            notes: "listing has no asking price".to_string(),
        };
    };
    range_component(
        factor,
        midpoint,
        preferences.price_min,
        preferences.price_max,
        PRICE_TOLERANCE,
        "price midpoint",
    )
}

fn revenue_component(listing: &Listing, preferences: &BuyerPreferences) -> MatchComponent {
    let factor = MatchFactor::Revenue;
    let Some(revenue) = listing.revenue else {
        return MatchComponent {
            factor,
            points: 0,
            notes: "listing has no revenue figure".to_string(),
        };
    };
    range_component(
        factor,
        revenue,
        preferences.revenue_min,
        preferences.revenue_max,
        REVENUE_TOLERANCE,
        "revenue",
    )
}

fn range_component(
    factor: MatchFactor,
    value: u64,
    min: Option<u64>,
    max: Option<u64>,
    tolerance: (u128, u128),
    subject: &str,
) -> MatchComponent {
    if min.is_none() && max.is_none() {
        return MatchComponent {
            factor,
            points: 0,
            notes: format!("no {subject} preference"),
        };
    }

    match fit(value, min, max, tolerance) {
        RangeFit::Inside => MatchComponent {
            factor,
            points: factor.weight(),
            notes: format!("{subject} {value} inside preferred range"),
        },
        RangeFit::WithinTolerance => MatchComponent {
            factor,
            points: factor.weight() / 2,
            notes: format!("{subject} {value} within tolerance of preferred range"),
        },
        RangeFit::Outside => MatchComponent {
            factor,
            points: 0,
            notes: format!("{subject} {value} outside preferred range"),
        },
    }
}

/// Open bounds are unbounded. Integer arithmetic keeps the comparison exact.
fn fit(value: u64, min: Option<u64>, max: Option<u64>, tolerance: (u128, u128)) -> RangeFit {
    let value = u128::from(value);
    let min = min.map(u128::from);
    let max = max.map(u128::from);
    let (slack, scale) = tolerance;

    let above_min = min.map(|min| value >= min).unwrap_or(true);
    let below_max = max.map(|max| value <= max).unwrap_or(true);
    if above_min && below_max {
        return RangeFit::Inside;
    }

    let above_band = min
        .map(|min| value * scale >= min * (scale - slack))
        .unwrap_or(true);
    let below_band = max
        .map(|max| value * scale <= max * (scale + slack))
        .unwrap_or(true);
    if above_band && below_band {
        RangeFit::WithinTolerance
    } else {
        RangeFit::Outside
    }
}
