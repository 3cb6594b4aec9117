// Year-over-year deltas for any per-year series. Used for resource and
// total standard fuel, cost, unit cost, and production output/value series.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearDelta {
    pub value: Option<f64>,
    /// `value[i] - value[i-1]`; undefined for the first year.
    pub delta: Option<f64>,
    /// Relative change; undefined for the first year or a zero prior value.
    pub percent: Option<f64>,
}

/// Accepts plain `f64` series (totals) as well as `Option<f64>` series
/// where some years are undefined.
pub fn year_over_year<T>(series: &[T]) -> Vec<YearDelta>
where
    T: Into<Option<f64>> + Copy,
{
    let values: Vec<Option<f64>> = series.iter().map(|v| (*v).into()).collect();
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let previous = if i == 0 { None } else { values[i - 1] };
            let delta = match (value, previous) {
                (Some(v), Some(p)) => Some(v - p),
                _ => None,
            };
            let percent = match (delta, previous) {
                (Some(d), Some(p)) if p != 0.0 => Some(d / p),
                _ => None,
            };
            YearDelta {
                value,
                delta,
                percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_policy() {
        let out = year_over_year(&[100.0, 150.0, 0.0, 0.0]);
        let deltas: Vec<_> = out.iter().map(|d| d.delta).collect();
        let percents: Vec<_> = out.iter().map(|d| d.percent).collect();
        assert_eq!(deltas, vec![None, Some(50.0), Some(-150.0), Some(0.0)]);
        assert_eq!(percents, vec![None, Some(0.5), Some(-1.0), None]);
    }

    #[test]
    fn test_undefined_years_break_the_chain() {
        let out = year_over_year(&[Some(10.0), None, Some(30.0)]);
        assert_eq!(out[1].delta, None);
        assert_eq!(out[2].delta, None);
        assert_eq!(out[2].value, Some(30.0));
    }

    #[test]
    fn test_single_and_empty_series() {
        assert!(year_over_year::<f64>(&[]).is_empty());
        let one = year_over_year(&[5.0]);
        assert_eq!(one, vec![YearDelta { value: Some(5.0), delta: None, percent: None }]);
    }

    #[test]
    fn test_negative_prior_value_still_yields_percent() {
        let out = year_over_year(&[-4.0, -2.0]);
        assert_eq!(out[1].delta, Some(2.0));
        assert_eq!(out[1].percent, Some(-0.5));
    }
}
