// bp-core/src/units.rs

use uom::si::f64::{
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
    Volume as UomVolume, VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;
pub type Volume = UomVolume;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn days(v: f64) -> Time {
    use uom::si::time::day;
    Time::new::<day>(v)
}

/// Volumetric flow given in m³/d, the unit plant flows are quoted in.
#[inline]
pub fn m3_per_day(v: f64) -> VolumeRate {
    m3(v) / days(1.0)
}

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn as_m3(v: Volume) -> f64 {
    use uom::si::volume::cubic_meter;
    v.get::<cubic_meter>()
}

#[inline]
pub fn as_days(t: Time) -> f64 {
    use uom::si::time::day;
    t.get::<day>()
}

#[inline]
pub fn as_m3_per_day(q: VolumeRate) -> f64 {
    as_m3(q * days(1.0))
}

#[inline]
pub fn as_celsius(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    #[test]
    fn constructors_smoke() {
        let _v = m3(400.0);
        let _q = m3_per_day(1000.0);
        let _t = days(5.0);
        let _c = celsius(20.0);
    }

    #[test]
    fn flow_round_trips_through_si() {
        let tol = Tolerances::default();
        assert!(nearly_equal(as_m3_per_day(m3_per_day(1000.0)), 1000.0, tol));
        assert!(nearly_equal(as_days(days(40.0)), 40.0, tol));
        assert!(nearly_equal(as_celsius(celsius(10.0)), 10.0, tol));
    }
}
