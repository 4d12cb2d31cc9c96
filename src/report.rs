//! PTF report rendering: a pure function of a completed dataset.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::dataset::{Condition, PerformanceDataset, PropertySnapshot};
use crate::oracle::{
    fuel_flow_property, PROP_GAMMA_DEG, PROP_MACH, PROP_VC_KTS, PROP_VT_FPS, PROP_VT_KTS,
    PROP_WEIGHT_LBS,
};

// Unit conversions.
const PPS_TO_KG_PER_MIN: f64 = 27.2155422;
const FPS_TO_FPM: f64 = 60.0;
const LBS_TO_KG: f64 = 0.453592;

pub const EMPTY_REPORT: &str = "No valid flight levels";

/// Render the PTF table. A level contributes a row only when all three
/// phases captured complete snapshots; an empty dataset yields the explicit
/// diagnostic string rather than failing.
pub fn render(data: &PerformanceDataset, name: &str) -> String {
    render_at(data, name, build_date())
}

fn render_at(data: &PerformanceDataset, name: &str, date: String) -> String {
    let levels: Vec<u32> = data
        .cruise
        .keys()
        .copied()
        .filter(|&fl| data.level_complete(fl))
        .collect();

    if levels.is_empty() {
        return EMPTY_REPORT.to_string();
    }

    let mut table = String::new();
    let mut rendered: Vec<u32> = Vec::new();
    for &fl in &levels {
        match render_row(data, fl) {
            Some(row) => {
                table.push_str(&row);
                rendered.push(fl);
            }
            // A complete level with a snapshot missing a required property
            // cannot produce a row; leave it out rather than guess values.
            None => continue,
        }
    }

    // The header describes a level that actually contributed a row.
    let (first, last) = match (rendered.first(), rendered.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return EMPTY_REPORT.to_string(),
    };
    match render_header(data, name, &date, first, last) {
        Some(header) => format!("{header}{table}"),
        None => EMPTY_REPORT.to_string(),
    }
}

fn render_row(data: &PerformanceDataset, fl: u32) -> Option<String> {
    let cruise = data.cruise.get(&fl)?;
    let climb = data.climb.get(&fl)?;
    let descent = data.descent.get(&fl)?;

    let cruise_fuel = |c: Condition| total_fuel_rate(cruise.get(&c)?, data.num_engines);
    let cruise_tas = cruise.get(&Condition::Nominal)?.get(PROP_VT_KTS)? as i64;

    let climb_tas = climb.get(&Condition::Nominal)?.get(PROP_VT_KTS)? as i64;
    let climb_roc = |c: Condition| rate_of_climb_fpm(climb.get(&c)?);
    let climb_fuel_nom = total_fuel_rate(climb.get(&Condition::Nominal)?, data.num_engines)?;

    let descent_tas = descent.get(PROP_VT_KTS)? as i64;
    let descent_rod = -rate_of_climb_fpm(descent)?;
    let descent_fuel = total_fuel_rate(descent, data.num_engines)?;

    let mut row = String::new();
    let _ = writeln!(
        row,
        "{fl:3} |{cruise_tas:5} {:6.1} {:6.1} {:6.1} |{climb_tas:5} {:5} {:4} {:4} {climb_fuel_nom:8.1}  |{descent_tas:5} {descent_rod:6} {descent_fuel:7.1}",
        cruise_fuel(Condition::Low)?,
        cruise_fuel(Condition::Nominal)?,
        cruise_fuel(Condition::High)?,
        climb_roc(Condition::Low)?,
        climb_roc(Condition::Nominal)?,
        climb_roc(Condition::High)?,
    );
    let _ = writeln!(
        row,
        "    |                           |                                |                     "
    );
    Some(row)
}

fn render_header(
    data: &PerformanceDataset,
    name: &str,
    date: &str,
    first_fl: u32,
    max_fl: u32,
) -> Option<String> {
    let cruise = data.cruise.get(&first_fl)?;
    let climb = data.climb.get(&first_fl)?;
    let descent = data.descent.get(&first_fl)?;

    let cas = |snap: &PropertySnapshot| snap.get(PROP_VC_KTS).map(|v| v as i64);
    let mass_kg = |c: Condition| {
        cruise
            .get(&c)?
            .get(PROP_WEIGHT_LBS)
            .map(|w| (w * LBS_TO_KG) as i64)
    };

    let climb_cas_low = cas(climb.get(&Condition::Low)?)?;
    let climb_cas_high = cas(climb.get(&Condition::High)?)?;
    let climb_mach = climb.get(&Condition::Nominal)?.get(PROP_MACH)?;
    let cruise_cas_low = cas(cruise.get(&Condition::Low)?)?;
    let cruise_cas_high = cas(cruise.get(&Condition::High)?)?;
    let cruise_mach = cruise.get(&Condition::Nominal)?.get(PROP_MACH)?;
    let descent_cas = cas(descent)?;
    let descent_mach = descent.get(PROP_MACH)?;

    let low_mass = mass_kg(Condition::Low)?;
    let nom_mass = mass_kg(Condition::Nominal)?;
    let high_mass = mass_kg(Condition::High)?;
    let max_alt = i64::from(max_fl) * 100;

    let mut h = String::new();
    let _ = writeln!(h, " PERFORMANCE TABLE FILE                                      {date}");
    let _ = writeln!(h);
    let _ = writeln!(h, " AC/Type: {name}");
    let _ = writeln!(h);
    let _ = writeln!(h, " Speeds:   CAS(LO/HI)  Mach   Mass Levels [kg]");
    let _ = writeln!(h, " climb   - {climb_cas_low}/{climb_cas_high}     {climb_mach:.2}   low     -  {low_mass}");
    let _ = writeln!(h, " cruise  - {cruise_cas_low}/{cruise_cas_high}     {cruise_mach:.2}   nominal -  {nom_mass}        Max Alt. [ft]: {max_alt}");
    let _ = writeln!(h, " descent - {descent_cas}/{descent_cas}     {descent_mach:.2}   high    -  {high_mass}");
    let _ = writeln!(h, "{}", "=".repeat(90));
    let _ = writeln!(h, " FL |          CRUISE           |              CLIMB             |      DESCENT");
    let _ = writeln!(h, "    |  TAS          fuel        |  TAS   ROCD          fuel      |  TAS   ROCD   fuel");
    let _ = writeln!(h, "    | [kts]       [kg/min]      | [kts] [fpm]        [kg/min]    | [kts] [fpm] [kg/min]");
    let _ = writeln!(h, "    |       lo    nom    hi     |       lo   nom   hi    nom     |        nom    nom");
    let _ = writeln!(h, "{}", "=".repeat(90));
    Some(h)
}

/// Sum per-engine fuel-flow rates, converted pps to kg/min.
fn total_fuel_rate(snap: &PropertySnapshot, num_engines: usize) -> Option<f64> {
    let mut total = 0.0;
    for engine in 0..num_engines {
        total += PPS_TO_KG_PER_MIN * snap.get(&fuel_flow_property(engine))?;
    }
    Some(total)
}

/// Vertical speed in ft/min from the snapshot's gamma and true airspeed.
fn rate_of_climb_fpm(snap: &PropertySnapshot) -> Option<i64> {
    let gamma_deg = snap.get(PROP_GAMMA_DEG)?;
    let vt_fps = snap.get(PROP_VT_FPS)?;
    Some((gamma_deg.to_radians().sin() * vt_fps * FPS_TO_FPM) as i64)
}

/// Build date as `Mmm dd yyyy`, derived from the epoch without pulling in a
/// calendar dependency.
fn build_date() -> String {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let days_since_epoch = now / 86_400;

    let mut year = 1970u64;
    let mut remaining = days_since_epoch;
    loop {
        let days_in_year = if leap(year) { 366 } else { 365 };
        if remaining < days_in_year {
            break;
        }
        remaining -= days_in_year;
        year += 1;
    }
    let month_days = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 0usize;
    for (i, &days) in month_days.iter().enumerate() {
        let d = if i == 1 && leap(year) { 29 } else { days };
        if remaining < d {
            month = i;
            break;
        }
        remaining -= d;
    }
    format!("{} {:02} {}", MONTHS[month], remaining + 1, year)
}

fn leap(year: u64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}
