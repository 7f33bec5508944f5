use crate::config::Extrapolate;

/// Piecewise-linear interpolation of `value` through an input/output table.
///
/// Segment selection picks the last segment whose lower bound is <= value,
/// so inputs past either end are handled by the edge segment plus the
/// configured extrapolation mode.
pub fn interpolate(
    value: f64,
    input_range: &[f64],
    output_range: &[f64],
    extrapolate_left: Extrapolate,
    extrapolate_right: Extrapolate,
) -> f64 {
    debug_assert!(input_range.len() >= 2);
    debug_assert_eq!(input_range.len(), output_range.len());

    let index = range_index(value, input_range);
    segment(
        value,
        input_range[index],
        input_range[index + 1],
        output_range[index],
        output_range[index + 1],
        extrapolate_left,
        extrapolate_right,
    )
}

fn range_index(value: f64, input_range: &[f64]) -> usize {
    let mut index = 1;
    while index < input_range.len() - 1 && input_range[index] <= value {
        index += 1;
    }
    index - 1
}

fn segment(
    value: f64,
    input_min: f64,
    input_max: f64,
    output_min: f64,
    output_max: f64,
    extrapolate_left: Extrapolate,
    extrapolate_right: Extrapolate,
) -> f64 {
    let mut result = value;

    if result < input_min {
        match extrapolate_left {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = input_min,
            Extrapolate::Extend => {}
        }
    }
    if result > input_max {
        match extrapolate_right {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = input_max,
            Extrapolate::Extend => {}
        }
    }

    if output_min == output_max {
        return output_min;
    }
    if input_min == input_max {
        return if value <= input_min { output_min } else { output_max };
    }

    output_min + (result - input_min) / (input_max - input_min) * (output_max - output_min)
}
