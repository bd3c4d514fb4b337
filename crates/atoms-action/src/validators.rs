//! Physical invariants that no single action owns.

use atoms_core::errors::{AtomsError, PhysicsError};
use atoms_core::units::{require_temperature_delta, require_time, require_volume};
use atoms_core::{Quantity, Unit, ValidationPolicy};
use atoms_matter::Container;

/// Total mass of every content across `containers`, in grams.
pub fn total_mass_g(containers: &[Container]) -> f64 {
    containers.iter().map(Container::total_mass_g).sum()
}

/// Fails when the total mass of `after` drifts from `before` by more than the policy tolerance.
pub fn check_mass_conservation(
    before: &[Container],
    after: &[Container],
    policy: &ValidationPolicy,
) -> Result<(), AtomsError> {
    let before_g = total_mass_g(before);
    let after_g = total_mass_g(after);
    let delta = (after_g - before_g).abs();
    if delta > policy.mass_tolerance_g {
        return Err(PhysicsError::mass_balance(
            "Mass conservation invariant violated.",
            Quantity::new(after_g, Unit::Gram).to_string(),
            Quantity::new(before_g, Unit::Gram).to_string(),
            format!(
                "Adjust transfer and reaction stoichiometry so total container mass stays within {} gram of {before_g} gram.",
                policy.mass_tolerance_g
            ),
        )
        .into());
    }
    Ok(())
}

/// Multiplier applied to a container's volume at its current average temperature.
pub fn expansion_factor(container: &Container, policy: &ValidationPolicy) -> f64 {
    let alpha = container.max_expansion_coefficient(policy.default_expansion_coefficient_per_k);
    let excess = container.average_temperature_c() - policy.reference_temperature_c;
    if excess > 0.0 {
        1.0 + alpha * excess
    } else {
        1.0
    }
}

/// Fails when adding `incoming` would push the thermally expanded volume past capacity.
///
/// Overshoot within `unresolved_tolerance_ml` is float noise and passes.
pub fn check_volume_feasibility(
    container: &Container,
    incoming: Quantity,
    policy: &ValidationPolicy,
) -> Result<(), AtomsError> {
    let incoming_ml = require_volume(incoming)?.base_value();
    let current_ml = container.current_volume_ml();
    let factor = expansion_factor(container, policy);
    let effective_ml = (current_ml + incoming_ml) * factor;
    let limit_ml = container.max_volume_ml();

    if effective_ml > limit_ml + policy.unresolved_tolerance_ml {
        let safe_added = (limit_ml / factor - current_ml).max(0.0);
        return Err(PhysicsError::volume_overflow(
            format!(
                "Projected expanded volume exceeds container capacity for {}.",
                container.label()
            ),
            Quantity::new(effective_ml, Unit::Milliliter).to_string(),
            Quantity::new(limit_ml, Unit::Milliliter).to_string(),
            format!(
                "Reduce transfer volume from {incoming} to below {safe_added:.3} milliliter to maintain safe headspace in {}.",
                container.label()
            ),
        )
        .into());
    }
    Ok(())
}

/// Fails when shifting `container` by `delta` breaks its bounds, a flash point or the ramp limit.
///
/// `delta` is a temperature difference; `duration`, when present, is the ramp time.
pub fn check_thermal_safety(
    container: &Container,
    delta: Quantity,
    duration: Option<Quantity>,
    policy: &ValidationPolicy,
) -> Result<(), AtomsError> {
    let delta_c = require_temperature_delta(delta)?.base_value();
    let target_c = container.average_temperature_c() + delta_c;
    let target = Quantity::new(target_c, Unit::Celsius);
    let max_c = container.max_temp().value_in(Unit::Celsius)?;
    let min_c = container.min_temp().value_in(Unit::Celsius)?;

    if target_c > max_c {
        return Err(PhysicsError::thermal_excursion(
            format!(
                "Target temperature exceeds max limit for {}.",
                container.label()
            ),
            target.to_string(),
            container.max_temp().to_string(),
            format!(
                "Reduce target temperature so {} remains at or below {}.",
                container.label(),
                container.max_temp()
            ),
        )
        .into());
    }

    if target_c < min_c {
        return Err(PhysicsError::thermal_excursion(
            format!(
                "Target temperature is below min limit for {}.",
                container.label()
            ),
            target.to_string(),
            container.min_temp().to_string(),
            format!(
                "Increase target temperature so {} remains at or above {}.",
                container.label(),
                container.min_temp()
            ),
        )
        .into());
    }

    for matter in container.contents() {
        let Some(flash) = matter.effective_flash_point() else {
            continue;
        };
        let flash_c = flash.to(Unit::Celsius)?;
        if target_c >= flash_c.magnitude() {
            return Err(PhysicsError::thermal_excursion(
                format!(
                    "Target temperature crosses flash point for {} in {}.",
                    matter.name(),
                    container.label()
                ),
                target.to_string(),
                flash_c.to_string(),
                format!(
                    "Keep {} below its flash point ({flash_c}) or choose inert atmosphere and explosion-rated hardware.",
                    matter.name()
                ),
            )
            .into());
        }
    }

    if let Some(duration) = duration {
        let ramp_s = require_time(duration)?.base_value();
        if ramp_s <= 0.0 {
            return Err(PhysicsError::thermal_excursion(
                "Temperature ramp duration must be positive.",
                duration.to_string(),
                "> 0 second",
                "Set a positive duration for the thermal ramp.",
            )
            .into());
        }
        let rate = delta_c.abs() / ramp_s;
        let limit = policy.max_ramp_rate_c_per_s;
        if rate > limit {
            return Err(PhysicsError::thermal_excursion(
                "Temperature ramp rate exceeds safe limit.",
                format!("{rate:.3} delta_degC / second"),
                format!("{limit} delta_degC / second"),
                format!(
                    "Increase the ramp duration to at least {:.3} second to keep the rate at or below {limit} delta_degC per second.",
                    delta_c.abs() / limit
                ),
            )
            .into());
        }
    }
    Ok(())
}
