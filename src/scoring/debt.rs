//! Technical debt estimates

/// Remediation cost of one code smell
pub const CODE_SMELL_MINUTES: u64 = 5;
pub const BUG_MINUTES: u64 = 15;
pub const VULNERABILITY_MINUTES: u64 = 30;

/// One working day
pub const MINUTES_PER_DAY: u64 = 8 * 60;

const MIN_DEVELOPMENT_MINUTES: u64 = 60;
const FLOW_MINUTES: u64 = 10;
const SUB_FLOW_MINUTES: u64 = 5;

pub fn calculate_tech_debt_minutes(code_smells: u64, bugs: u64, vulnerabilities: u64) -> u64 {
    code_smells * CODE_SMELL_MINUTES + bugs * BUG_MINUTES + vulnerabilities * VULNERABILITY_MINUTES
}

/// Estimated effort that went into the flows, never below one hour
pub fn estimate_development_minutes(flows: u64, sub_flows: u64) -> u64 {
    (flows * FLOW_MINUTES + sub_flows * SUB_FLOW_MINUTES).max(MIN_DEVELOPMENT_MINUTES)
}

/// Debt as a percentage of development time; 0 when there is no development time
pub fn calculate_debt_ratio(debt_minutes: u64, development_minutes: u64) -> f64 {
    if development_minutes == 0 {
        return 0.0;
    }
    debt_minutes as f64 / development_minutes as f64 * 100.0
}

/// `45min`, `2h 5m`, `3h`, `1d`, `1d 1h`
///
/// From one day up, the total rounds up to whole hours before splitting into
/// 8-hour days, so the hours part is always below 8.
pub fn format_tech_debt(minutes: u64) -> String {
    if minutes < 60 {
        return format!("{}min", minutes);
    }
    if minutes < MINUTES_PER_DAY {
        let (hours, rest) = (minutes / 60, minutes % 60);
        return if rest == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, rest)
        };
    }
    let total_hours = minutes.div_ceil(60);
    let hours_per_day = MINUTES_PER_DAY / 60;
    let (days, hours) = (total_hours / hours_per_day, total_hours % hours_per_day);
    if hours == 0 {
        format!("{}d", days)
    } else {
        format!("{}d {}h", days, hours)
    }
}
