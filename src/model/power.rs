/**
 * Converts gauge pressure (kgf/cm²) into head (mca).
 */
const PRESSURE_TO_HEAD: f64 = 10.0;

/**
 * Unit factor for flow in m³/h and head in mca, yielding power in CV.
 */
const CV_UNIT_FACTOR: f64 = 270.0;

/**
 * Assumed pump efficiency. Not measured.
 */
const ASSUMED_EFFICIENCY: f64 = 0.65;

/**
 * Kilowatts per CV.
 */
const CV_TO_KW: f64 = 0.7457;

/**
 * Result of a power calculation. Both values are absent when the inputs were incomplete.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerOutput {
    pub power_cv: Option<f64>,
    pub power_kw: Option<f64>,
}

/**
 * Whether a measured value counts as present. Zero is treated as not measured.
 */
pub fn is_present(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v != 0.0 && !v.is_nan())
}

/**
 * Converts pressure into head.
 *
 * # Arguments
 * `pressure`: Gauge pressure.
 *
 * # Returns
 * The head, or None if pressure is missing.
 */
pub fn head(pressure: Option<f64>) -> Option<f64> {
    if !is_present(pressure) {
        return None;
    }
    pressure.map(|pressure| pressure * PRESSURE_TO_HEAD)
}

/**
 * Calculates consumed power in CV.
 *
 * The rotational speed is only a presence gate and does not take part in the formula.
 *
 * # Arguments
 * `flow`: Volumetric flow rate.
 * `pressure`: Gauge pressure.
 * `rotational_speed`: Pump rotational speed.
 *
 * # Returns
 * Power in CV rounded to 3 decimals, or None if any input is missing or zero.
 */
pub fn power_cv(flow: Option<f64>, pressure: Option<f64>, rotational_speed: Option<f64>) -> Option<f64> {
    let (Some(flow), Some(pressure)) = (flow, pressure) else {
        return None;
    };
    if !is_present(Some(flow)) || !is_present(Some(pressure)) || !is_present(rotational_speed) {
        return None;
    }
    let head = pressure * PRESSURE_TO_HEAD;
    let power = (flow * head) / (CV_UNIT_FACTOR * ASSUMED_EFFICIENCY);
    Some(round_to(power, 3))
}

/**
 * Converts power in CV into kW, rounded to 2 decimals.
 */
pub fn power_kw(power_cv: Option<f64>) -> Option<f64> {
    if !is_present(power_cv) {
        return None;
    }
    power_cv.map(|power_cv| round_to(power_cv * CV_TO_KW, 2))
}

/**
 * Runs the full calculation for arbitrary inputs.
 */
pub fn calculate(flow: Option<f64>, pressure: Option<f64>, rotational_speed: Option<f64>) -> PowerOutput {
    let power_cv = power_cv(flow, pressure, rotational_speed);
    PowerOutput { power_cv, power_kw: power_kw(power_cv) }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_calculate_reference_values() {
        let output = calculate(Some(10.0), Some(2.0), Some(1750.0));
        assert_eq!(output.power_cv, Some(1.14));
        assert_eq!(output.power_kw, Some(0.85));
    }

    #[test]
    fn test_calculate_zero_flow_is_missing() {
        let output = calculate(Some(0.0), Some(2.0), Some(1750.0));
        assert_eq!(output, PowerOutput { power_cv: None, power_kw: None });
    }

    #[test]
    fn test_calculate_missing_rotation() {
        assert_eq!(calculate(Some(10.0), Some(2.0), None).power_cv, None);
        assert_eq!(calculate(Some(10.0), Some(2.0), Some(0.0)).power_cv, None);
    }

    #[test]
    fn test_calculate_missing_pressure() {
        assert_eq!(calculate(Some(10.0), None, Some(1750.0)).power_cv, None);
        assert_eq!(calculate(Some(10.0), Some(f64::NAN), Some(1750.0)).power_cv, None);
    }

    #[test]
    fn test_rotation_does_not_change_result() {
        assert_eq!(power_cv(Some(35.1), Some(4.5), Some(300.0)), power_cv(Some(35.1), Some(4.5), Some(3600.0)));
    }

    #[test]
    fn test_power_cv_rounding() {
        // 30 * 60 / 175.5 = 10.2564...
        assert_eq!(power_cv(Some(30.0), Some(6.0), Some(1750.0)), Some(10.256));
    }

    #[test]
    fn test_power_kw_of_zero_is_none() {
        assert_eq!(power_kw(Some(0.0)), None);
        assert_eq!(power_kw(None), None);
        assert_eq!(power_kw(Some(10.256)), Some(7.65));
    }

    #[test]
    fn test_head() {
        assert_eq!(head(Some(2.5)), Some(25.0));
        assert_eq!(head(Some(0.0)), None);
    }
}
