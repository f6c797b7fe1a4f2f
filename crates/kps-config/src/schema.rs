//! Settings schema.
//!
//! Every field has a default, so a settings file only lists what differs from
//! the reference kite power system (10.18 m² kite, 6 segments, 4 mm tether).

use kps_env::ProfileLaw;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub system: SystemDef,
    pub initial: InitialDef,
    pub solver: SolverDef,
    pub tether: TetherDef,
    pub kite: KiteDef,
    pub aero: AeroDef,
    pub environment: EnvironmentDef,
    pub four_point: FourPointDef,
    pub three_line: ThreeLineDef,
    pub winch: WinchDef,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Single tether, kite lumped into one particle
    #[default]
    OnePoint,
    /// Single tether, kite resolved into four particles on a bridle
    FourPoint,
    /// Middle tether plus two steering lines, kite resolved into apex and tips
    ThreeLine,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemDef {
    pub model: ModelKind,
    /// Number of tether segments per line
    pub segments: usize,
    /// Gravitational acceleration (m/s²)
    pub g_earth: f64,
}

impl Default for SystemDef {
    fn default() -> Self {
        Self {
            model: ModelKind::OnePoint,
            segments: 6,
            g_earth: kps_core::constants::G_EARTH_MPS2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InitialDef {
    pub elevation_deg: f64,
    /// Reel-out speed (m/s), positive when the tether is paid out
    pub v_reel_out: f64,
    pub depower_deg: f64,
    /// Relative steering input, -1..1
    pub steering: f64,
}

impl Default for InitialDef {
    fn default() -> Self {
        Self {
            elevation_deg: 70.7,
            v_reel_out: 0.0,
            depower_deg: 0.0,
            steering: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverDef {
    /// Max-norm tolerance on the steady-state acceleration residual (m/s²)
    pub steady_tol: f64,
    pub max_iter: usize,
    /// Relative step of the finite-difference Jacobian
    pub fd_epsilon: f64,
    /// Initial Levenberg-Marquardt damping, relative to the largest diagonal entry
    pub lm_damping: f64,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            steady_tol: 1e-6,
            max_iter: 200,
            fd_epsilon: 1e-7,
            lm_damping: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TetherDef {
    /// Initial (middle) tether length (m)
    pub l_tether: f64,
    pub d_tether_mm: f64,
    /// Tether material density (kg/m³)
    pub rho_tether: f64,
    /// Unit spring constant (N); segment stiffness is c_spring / segment length
    pub c_spring: f64,
    /// Unit damping (Ns); segment damping is damping / segment length
    pub damping: f64,
    pub cd_tether: f64,
    /// Stiffness multiplier of a compressed tether segment
    pub compression_tether: f64,
    /// Stiffness multiplier of a compressed kite-frame segment
    pub compression_kite: f64,
    /// Damping multiplier of kite-frame segments
    pub rel_damping: f64,
}

impl Default for TetherDef {
    fn default() -> Self {
        Self {
            l_tether: 150.0,
            d_tether_mm: 4.0,
            rho_tether: 724.0,
            c_spring: 614_600.0,
            damping: 473.0,
            cd_tether: 0.958,
            compression_tether: 0.05,
            compression_kite: 0.25,
            rel_damping: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KiteDef {
    /// Projected kite area (m²)
    pub area: f64,
    pub mass: f64,
    /// Kite control unit mass (one- and four-point models)
    pub kcu_mass: f64,
    /// Side area in percent of the projected area
    pub rel_side_area: f64,
    /// Steering coefficient of the one-point model
    pub c_s: f64,
    /// Yaw/roll coupling correction of the steering input
    pub c2_cor: f64,
    /// Drag multiplier accounting for the bridle
    pub bridle_drag: f64,
    /// Extra relative drag per unit of steering input
    pub steering_drag: f64,
}

impl Default for KiteDef {
    fn default() -> Self {
        Self {
            area: 10.18,
            mass: 6.2,
            kcu_mass: 8.4,
            rel_side_area: 30.6,
            c_s: 2.59,
            c2_cor: 0.93,
            bridle_drag: 1.1,
            steering_drag: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AeroDef {
    pub alpha_cl: Vec<f64>,
    pub cl_list: Vec<f64>,
    pub alpha_cd: Vec<f64>,
    pub cd_list: Vec<f64>,
    /// Added to the geometric angle of attack before lookup (deg)
    pub alpha_zero: f64,
}

impl Default for AeroDef {
    fn default() -> Self {
        Self {
            alpha_cl: vec![
                -180.0, -160.0, -90.0, -20.0, -10.0, -5.0, 0.0, 20.0, 40.0, 90.0, 160.0, 180.0,
            ],
            cl_list: vec![0.0, 0.5, 0.0, 0.08, 0.125, 0.15, 0.2, 1.0, 1.0, 0.0, -0.5, 0.0],
            alpha_cd: vec![
                -180.0, -170.0, -140.0, -90.0, -20.0, 0.0, 20.0, 90.0, 140.0, 170.0, 180.0,
            ],
            cd_list: vec![0.5, 0.5, 0.5, 1.0, 0.2, 0.1, 0.2, 1.0, 0.5, 0.5, 0.5],
            alpha_zero: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentDef {
    /// Wind speed at the reference height (m/s)
    pub v_wind: f64,
    pub h_ref: f64,
    pub profile_law: ProfileLaw,
    /// Power-law exponent
    pub alpha: f64,
    /// Roughness length (m)
    pub z0: f64,
    /// Sea-level air density (kg/m³)
    pub rho_0: f64,
    /// Heights are clamped to at least this before the wind law is evaluated (m)
    pub h_min: f64,
    /// Downwind direction measured from the x axis (deg)
    pub wind_direction_deg: f64,
}

impl Default for EnvironmentDef {
    fn default() -> Self {
        Self {
            v_wind: 9.51,
            h_ref: 6.0,
            profile_law: ProfileLaw::ExpLog,
            alpha: 0.08163,
            z0: 0.0002,
            rho_0: 1.225,
            h_min: 6.0,
            wind_direction_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FourPointDef {
    /// Distance from the kite control unit up to the wing tips (m)
    pub h_bridle: f64,
    /// Height of the apex above the wing tips (m)
    pub height: f64,
    /// Distance between the wing tips (m)
    pub width: f64,
    /// Distance of the trailing edge particle behind the tips (m)
    pub depth: f64,
}

impl Default for FourPointDef {
    fn default() -> Self {
        Self {
            h_bridle: 4.9,
            height: 2.23,
            width: 5.77,
            depth: 1.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThreeLineDef {
    /// Arc length of the kite from tip to tip (m)
    pub width: f64,
    /// Radius of the circle the kite arc lies on (m)
    pub radius: f64,
    /// Chord at the centre of the kite (m)
    pub middle_length: f64,
    /// Chord at the tips (m)
    pub tip_length: f64,
    /// Aerodynamic samples per kite half
    pub aero_surfaces: usize,
    /// Width of the centre zone where the tip deflections are blended (m)
    pub min_steering_line_distance: f64,
    /// Share of the local lift handed to the steering line attachment
    pub steering_fraction: f64,
    /// Share of the remaining half-kite force carried by the apex
    pub apex_share: f64,
    pub d_steering_mm: f64,
    /// Point mass at each steering line attachment (kg)
    pub connection_mass: f64,
}

impl Default for ThreeLineDef {
    fn default() -> Self {
        Self {
            width: 8.0,
            radius: 4.8,
            middle_length: 1.6,
            tip_length: 0.9,
            aero_surfaces: 10,
            min_steering_line_distance: 1.0,
            steering_fraction: 0.2,
            apex_share: 0.5,
            d_steering_mm: 2.5,
            connection_mass: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WinchDef {
    pub drum_radius: f64,
    pub gear_ratio: f64,
    /// Inertia of motor, gearbox and drum, seen at the motor shaft (kg m²)
    pub inertia_total: f64,
    /// Breakdown torque of the asynchronous machine (Nm)
    pub breakdown_torque: f64,
    /// Slip at breakdown torque
    pub breakdown_slip: f64,
    /// Rated synchronous angular speed (rad/s)
    pub omega_sn: f64,
    /// Coulomb friction force at the drum (N)
    pub f_coulomb: f64,
    /// Viscous friction coefficient at the drum (Ns/m)
    pub c_vf: f64,
    /// Below this speed the brake engages (m/s)
    pub brake_speed: f64,
}

impl Default for WinchDef {
    fn default() -> Self {
        Self {
            drum_radius: 0.1615,
            gear_ratio: 6.2,
            inertia_total: 0.082,
            breakdown_torque: 60.0,
            breakdown_slip: 0.1,
            omega_sn: 157.0,
            f_coulomb: 122.0,
            c_vf: 30.6,
            brake_speed: 0.01,
        }
    }
}
