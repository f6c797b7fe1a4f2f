//! Winch capability: maps a setpoint and the measured line tension to the
//! reel-out acceleration.

/// Winch command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WinchSetpoint {
    /// Reel-out speed (m/s)
    Speed(f64),
    /// Motor torque (Nm)
    Torque(f64),
}

impl Default for WinchSetpoint {
    fn default() -> Self {
        WinchSetpoint::Speed(0.0)
    }
}

pub trait WinchModel: Send + Sync {
    /// Reel-out acceleration (m/s²) at `speed` under `tension` (N).
    fn acceleration(&self, speed: f64, tension: f64, setpoint: WinchSetpoint, use_brake: bool)
    -> f64;
}

/// Asynchronous machine behind a gearbox and drum.
#[derive(Clone, Debug, PartialEq)]
pub struct AsyncMachine {
    pub drum_radius: f64,
    pub gear_ratio: f64,
    /// Inertia seen at the motor shaft (kg m²)
    pub inertia_total: f64,
    pub breakdown_torque: f64,
    pub breakdown_slip: f64,
    /// Rated synchronous angular speed (rad/s)
    pub omega_sn: f64,
    pub f_coulomb: f64,
    pub c_vf: f64,
    pub brake_speed: f64,
}

/// Speed scale of the smoothed Coulomb friction (m/s).
const FRICTION_SMOOTHING: f64 = 0.1;

impl AsyncMachine {
    pub fn from_settings(w: &kps_config::WinchDef) -> Self {
        Self {
            drum_radius: w.drum_radius,
            gear_ratio: w.gear_ratio,
            inertia_total: w.inertia_total,
            breakdown_torque: w.breakdown_torque,
            breakdown_slip: w.breakdown_slip,
            omega_sn: w.omega_sn,
            f_coulomb: w.f_coulomb,
            c_vf: w.c_vf,
            brake_speed: w.brake_speed,
        }
    }

    /// Motor angular speed for a reel-out speed.
    fn omega(&self, speed: f64) -> f64 {
        self.gear_ratio / self.drum_radius * speed
    }

    /// Kloss torque curve for the given set and actual motor speeds.
    pub fn motor_torque(&self, omega_set: f64, omega: f64) -> f64 {
        let slip = (omega_set - omega) / self.omega_sn;
        let sb = self.breakdown_slip;
        2.0 * self.breakdown_torque * slip * sb / (slip * slip + sb * sb)
    }

    /// Friction force at the drum, opposing motion.
    pub fn friction(&self, speed: f64) -> f64 {
        self.f_coulomb * (speed / FRICTION_SMOOTHING).tanh() + self.c_vf * speed
    }
}

impl WinchModel for AsyncMachine {
    fn acceleration(
        &self,
        speed: f64,
        tension: f64,
        setpoint: WinchSetpoint,
        use_brake: bool,
    ) -> f64 {
        let torque = match setpoint {
            WinchSetpoint::Speed(v_set) => {
                if use_brake && speed.abs() < self.brake_speed && v_set.abs() < self.brake_speed {
                    return 0.0;
                }
                self.motor_torque(self.omega(v_set), self.omega(speed))
            }
            WinchSetpoint::Torque(torque) => torque,
        };
        let ratio = self.drum_radius / self.gear_ratio;
        let omega_dot = (torque + ratio * (tension - self.friction(speed))) / self.inertia_total;
        ratio * omega_dot
    }
}
