//! One-point kite model: a single tether of `N` segments with the kite lumped
//! into the top particle.
//!
//! The tether length is not part of the state vector. It is integrated
//! analytically from the reel-out speed between calls to
//! [`KiteModel::set_v_reel_out`].

use crate::error::{ModelError, ModelResult, check_dimension};
use crate::forces::segment_force;
use crate::frame::KiteFrame;
use crate::layout::{StateLayout, read_vec3, write_vec3};
use crate::model::{
    ACCEPT_NORM, KiteModel, MIN_APPARENT_WIND, ensure_finite_residual, environment_from_settings,
    norm, require,
};
use crate::particles::{Particles, Spring, SpringKind, TetherParams};
use crate::session::SessionState;
use kps_aero::AeroPolar;
use kps_config::Settings;
use kps_core::{Vec3, deg, pid, radians, try_normalize};
use kps_env::{Environment, StandardEnvironment};
use std::f64::consts::FRAC_PI_2;

/// Aerodynamic and mass properties of the lumped kite.
#[derive(Clone, Debug, PartialEq)]
pub struct KiteParams {
    pub area: f64,
    pub mass: f64,
    pub kcu_mass: f64,
    pub rel_side_area: f64,
    pub c_s: f64,
    pub c2_cor: f64,
    pub bridle_drag: f64,
    pub steering_drag: f64,
}

impl KiteParams {
    pub fn from_settings(kite: &kps_config::KiteDef) -> Self {
        Self {
            area: kite.area,
            mass: kite.mass,
            kcu_mass: kite.kcu_mass,
            rel_side_area: kite.rel_side_area,
            c_s: kite.c_s,
            c2_cor: kite.c2_cor,
            bridle_drag: kite.bridle_drag,
            steering_drag: kite.steering_drag,
        }
    }

    /// Lift, drag and steering force of the lumped kite. The apparent wind
    /// must not vanish.
    pub(crate) fn point_forces(
        &self,
        polar: &AeroPolar,
        alpha_zero: f64,
        kite: &PointKite,
    ) -> ModelResult<PointKiteForces> {
        let speed = kite.v_app.norm();
        let v_hat = kite.v_app / speed;
        let alpha = FRAC_PI_2 - (-v_hat.dot(&kite.z)).clamp(-1.0, 1.0).acos() - kite.depower;
        let alpha_deg = alpha.to_degrees() + alpha_zero;
        let (cl, cd) = polar.coefficients(alpha_deg);

        let k = 0.5 * kite.rho * speed * speed * self.area;
        let lift = k * cl * try_normalize(&v_hat.cross(&kite.y), "lift direction")?;

        let u_s = kite.steering;
        let drag = k * cd * self.bridle_drag * (1.0 + self.steering_drag * u_s.abs()) * v_hat;

        let p = kite.pos;
        let azimuth = p.y.atan2(p.x);
        let elevation = p.z.atan2(p.x.hypot(p.y));
        let corrected = u_s + self.c2_cor / speed * azimuth.sin() * elevation.cos();
        let steering = -k * self.rel_side_area / 100.0 * self.c_s * corrected * kite.y;

        Ok(PointKiteForces {
            lift,
            drag,
            steering,
            alpha_deg,
        })
    }
}

/// What the lumped kite aerodynamics see.
pub(crate) struct PointKite {
    /// Azimuth and elevation follow from the position
    pub pos: Vec3,
    pub v_app: Vec3,
    pub rho: f64,
    /// Unit vector from the kite down the top tether segment
    pub z: Vec3,
    /// Unit span axis
    pub y: Vec3,
    pub steering: f64,
    pub depower: f64,
}

pub(crate) struct PointKiteForces {
    pub lift: Vec3,
    pub drag: Vec3,
    pub steering: Vec3,
    pub alpha_deg: f64,
}

pub struct OnePointModel {
    layout: StateLayout,
    env: StandardEnvironment,
    polar: AeroPolar,
    tether: TetherParams,
    kite: KiteParams,
    alpha_zero: f64,
    gravity: Vec3,
    elevation: f64,
    initial_length: f64,
    initial_v_reel_out: f64,
    initial_steering: f64,
    initial_depower: f64,
    particles: Particles,
    springs: Vec<Spring>,
    forces: Vec<Vec3>,
    frame: Option<KiteFrame>,
    session: SessionState,
}

impl OnePointModel {
    pub fn new(settings: &Settings) -> ModelResult<Self> {
        let segments = settings.system.segments;
        require(segments > 0, "one-point model needs at least one segment")?;
        require(
            settings.tether.l_tether > 0.0,
            "tether length must be positive",
        )?;
        require(settings.kite.area > 0.0, "kite area must be positive")?;

        let aero = &settings.aero;
        let polar = AeroPolar::new(&aero.alpha_cl, &aero.cl_list, &aero.alpha_cd, &aero.cd_list)?;
        let tether = TetherParams::from_settings(&settings.tether);
        let layout = StateLayout::one_point(segments);

        let springs = (0..segments)
            .map(|i| Spring::new(pid(i), pid(i + 1), SpringKind::Tether, tether.diameter))
            .collect();

        let mut model = Self {
            env: environment_from_settings(&settings.environment),
            polar,
            tether,
            kite: KiteParams::from_settings(&settings.kite),
            alpha_zero: aero.alpha_zero,
            gravity: Vec3::new(0.0, 0.0, -settings.system.g_earth),
            elevation: radians(deg(settings.initial.elevation_deg)),
            initial_length: settings.tether.l_tether,
            initial_v_reel_out: settings.initial.v_reel_out,
            initial_steering: settings.initial.steering,
            initial_depower: radians(deg(settings.initial.depower_deg)),
            particles: Particles::new(layout.particle_count()),
            springs,
            forces: vec![Vec3::zeros(); layout.particle_count()],
            frame: None,
            session: SessionState::new(layout.particle_count(), 1),
            layout,
        };
        model.clear()?;
        Ok(model)
    }

    pub fn environment(&self) -> &StandardEnvironment {
        &self.env
    }

    pub fn set_depower(&mut self, depower: f64) {
        self.session.depower = depower;
    }

    /// Elevation angle used by the steady-state parametrization (rad).
    pub fn set_elevation(&mut self, elevation: f64) {
        self.elevation = elevation;
    }

    pub fn tether_length_at(&self, time: f64) -> f64 {
        self.session.tether_length_at(time)
    }

    fn radial(&self) -> Vec3 {
        Vec3::new(self.elevation.cos(), 0.0, self.elevation.sin())
    }

    fn update_segments(&mut self, seg_len: f64) {
        let n = self.layout.segments();
        for spring in &mut self.springs {
            spring.set_length(seg_len, self.tether.unit_stiffness, self.tether.unit_damping);
        }
        let m_seg = self.tether.segment_mass(seg_len, self.tether.diameter);
        for mass in &mut self.particles.mass[1..n] {
            *mass = m_seg;
        }
        self.particles.mass[n] = self.kite.mass + self.kite.kcu_mass + 0.5 * m_seg;
    }

    /// Lift, drag and steering force on the kite particle.
    fn aero_forces(&mut self) -> ModelResult<()> {
        let n = self.layout.segments();
        let kite = self.particles.pos[n];
        let wind = self.env.wind_at(kite.z);
        let rho = self.env.air_density(kite.z);
        let v_app = wind - self.particles.vel[n];
        self.session.v_wind_kite = wind;
        self.session.rho = rho;
        self.session.v_apparent = v_app;

        if v_app.norm() < MIN_APPARENT_WIND {
            self.session.lift = Vec3::zeros();
            self.session.drag = Vec3::zeros();
            return Ok(());
        }

        let z = try_normalize(&(self.particles.pos[n - 1] - kite), "kite z axis")?;
        let y = try_normalize(&kite.cross(&v_app), "kite y axis")?;
        let aero = self.kite.point_forces(
            &self.polar,
            self.alpha_zero,
            &PointKite {
                pos: kite,
                v_app,
                rho,
                z,
                y,
                steering: self.session.steering,
                depower: self.session.depower,
            },
        )?;

        self.forces[n] += aero.lift + aero.drag + aero.steering;
        self.session.lift = aero.lift;
        self.session.drag = aero.drag;
        self.session.alpha_deg = aero.alpha_deg;

        let e_y = try_normalize(&(y - y.dot(&z) * z), "kite frame e_y")?;
        self.frame = Some(KiteFrame {
            e_x: e_y.cross(&z),
            e_y,
            e_z: z,
        });
        Ok(())
    }
}

impl KiteModel for OnePointModel {
    fn layout(&self) -> &StateLayout {
        &self.layout
    }

    fn clear(&mut self) -> ModelResult<()> {
        let n = self.layout.segments();
        let ground_wind = self.env.ground_wind();
        let rho = self.env.air_density(0.0);
        self.session
            .reset(ground_wind, rho, &[self.initial_length], self.initial_v_reel_out);
        self.session.steering = self.initial_steering;
        self.session.depower = self.initial_depower;

        self.update_segments(self.initial_length / n as f64);
        let radial = self.radial();
        for i in 0..=n {
            let frac = i as f64 / n as f64;
            self.particles.pos[i] = frac * self.initial_length * radial;
            self.particles.vel[i] = Vec3::zeros();
        }
        self.forces.iter_mut().for_each(|f| *f = Vec3::zeros());
        self.session.last_positions.clone_from(&self.particles.pos);
        self.frame = None;
        Ok(())
    }

    fn residual(
        &mut self,
        y: &[f64],
        yd: &[f64],
        time: f64,
        res: &mut [f64],
    ) -> ModelResult<()> {
        let dim = self.layout.len();
        check_dimension("y", dim, y.len())?;
        check_dimension("yd", dim, yd.len())?;
        check_dimension("res", dim, res.len())?;

        let n = self.layout.segments();
        let length = self.tether_length_at(time);
        let seg_len = length / n as f64;
        if !(seg_len > 0.0) {
            return Err(ModelError::Diverged {
                what: "tether length",
                value: length,
            });
        }
        self.update_segments(seg_len);
        self.session.lengths[0] = length;

        self.particles.pos[0] = Vec3::zeros();
        self.particles.vel[0] = Vec3::zeros();
        for f in 0..n {
            let p = self.layout.particle_of(f);
            self.particles.pos[p] = read_vec3(y, self.layout.pos(f));
            self.particles.vel[p] = read_vec3(y, self.layout.vel(f));
        }

        self.forces.iter_mut().for_each(|f| *f = Vec3::zeros());
        for (i, spring) in self.springs.iter().enumerate() {
            let (p1, p2) = (spring.p1.index(), spring.p2.index());
            let segment = segment_force(
                &self.env,
                &self.tether,
                spring,
                &self.particles.pos[p1],
                &self.particles.pos[p2],
                &self.particles.vel[p1],
                &self.particles.vel[p2],
            )?;
            segment.apply(spring, &mut self.forces);
            if i == 0 {
                self.session.winch_forces[0] = self.forces[0].norm();
            }
        }
        self.session.v_wind_tether = self.env.wind_at(0.5 * self.particles.pos[n].z);
        self.aero_forces()?;

        for f in 0..n {
            let p = self.layout.particle_of(f);
            let (ip, iv) = (self.layout.pos(f), self.layout.vel(f));
            let res1 = self.particles.vel[p] - read_vec3(yd, ip);
            let res2 = read_vec3(yd, iv)
                - (self.gravity + self.forces[p] / self.particles.mass[p]);
            write_vec3(res, ip, &res1);
            write_vec3(res, iv, &res2);
        }
        ensure_finite_residual(res)?;

        if norm(res) < ACCEPT_NORM {
            self.session.last_positions.clone_from(&self.particles.pos);
        }
        self.session.iterations += 1;
        Ok(())
    }

    fn steady_param_count(&self) -> usize {
        2 * self.layout.segments()
    }

    fn steady_state(&self, x: &[f64]) -> ModelResult<(Vec<f64>, Vec<f64>)> {
        let n = self.layout.segments();
        check_dimension("steady parameters", 2 * n, x.len())?;

        let radial = self.radial();
        let mut y = vec![0.0; self.layout.len()];
        let mut yd = vec![0.0; self.layout.len()];
        for f in 0..n {
            let frac = (f + 1) as f64 / n as f64;
            let pos = frac * self.session.l_tether * radial + Vec3::new(x[f], 0.0, x[n + f]);
            let vel = frac * self.session.v_reel_out * radial;
            write_vec3(&mut y, self.layout.pos(f), &pos);
            write_vec3(&mut y, self.layout.vel(f), &vel);
            write_vec3(&mut yd, self.layout.pos(f), &vel);
        }
        Ok((y, yd))
    }

    fn steady_equations(&self, res: &[f64]) -> Vec<f64> {
        let n = self.layout.segments();
        let mut out = vec![0.0; 2 * n];
        for f in 0..n {
            let iv = self.layout.vel(f);
            out[f] = res[iv];
            out[n + f] = res[iv + 2];
        }
        out
    }

    fn session(&self) -> &SessionState {
        &self.session
    }

    fn positions(&self) -> &[Vec3] {
        &self.particles.pos
    }

    fn kite_frame(&self) -> Option<KiteFrame> {
        self.frame
    }

    fn set_v_reel_out(&mut self, v_reel_out: f64, t0: f64) {
        self.session.commit_reel_out(v_reel_out, t0);
    }

    fn set_steering(&mut self, steering: f64) {
        self.session.steering = steering;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> OnePointModel {
        let mut settings = Settings::default();
        settings.tether.l_tether = 392.0;
        OnePointModel::new(&settings).unwrap()
    }

    #[test]
    fn clear_builds_straight_tether() {
        let m = model();
        let kite = m.positions()[6];
        assert!((kite.norm() - 392.0).abs() < 1e-9);
        let elevation = kite.z.atan2(kite.x).to_degrees();
        assert!((elevation - 70.7).abs() < 1e-9);
    }

    #[test]
    fn masses_follow_segment_length() {
        let m = model();
        let m_seg = m.tether.segment_mass(392.0 / 6.0, 0.004);
        assert!((m.particles.mass[3] - m_seg).abs() < 1e-12);
        assert!((m.particles.mass[6] - (6.2 + 8.4 + 0.5 * m_seg)).abs() < 1e-12);
    }

    #[test]
    fn reel_out_integrates_tether_length() {
        let mut m = model();
        m.set_v_reel_out(2.0, 0.0);
        m.set_v_reel_out(2.0, 1.0);
        assert!((m.session().l_tether - 393.0).abs() < 1e-12);
        assert!((m.tether_length_at(2.0) - 395.0).abs() < 1e-12);
    }

    #[test]
    fn clear_comes_to_rest_while_reeling() {
        let mut settings = Settings::default();
        settings.initial.v_reel_out = 2.0;
        let mut m = OnePointModel::new(&settings).unwrap();
        m.set_v_reel_out(3.0, 0.5);
        m.clear().unwrap();

        assert!(m.particles.vel.iter().all(|v| *v == Vec3::zeros()));
        assert_eq!(m.session().v_reel_out, 2.0);
        assert_eq!(m.session().l_tether, settings.tether.l_tether);
        // the steady-state guess still moves with the tether
        let (y, _) = m.steady_state(&vec![0.0; 12]).unwrap();
        let kite_vel = read_vec3(&y, m.layout().vel(5));
        assert!((kite_vel.norm() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn steady_state_at_zero_params_is_straight_and_consistent() {
        let mut m = model();
        let (y, yd) = m.steady_state(&vec![0.0; 12]).unwrap();
        let mut res = vec![0.0; 36];
        m.residual(&y, &yd, 0.0, &mut res).unwrap();
        // kinematic equations hold exactly
        assert!(res[..18].iter().all(|r| *r == 0.0));
        // nothing acts sideways in a wind along x
        for f in 0..6 {
            assert_eq!(res[m.layout().vel(f) + 1], 0.0);
        }
        // unloaded tether: the winch only feels half the ground segment's drag
        assert!(m.winch_forces()[0] < 20.0);
    }

    #[test]
    fn lift_points_up_in_horizontal_wind() {
        let mut m = model();
        let (y, yd) = m.steady_state(&vec![0.0; 12]).unwrap();
        let mut res = vec![0.0; 36];
        m.residual(&y, &yd, 0.0, &mut res).unwrap();
        let s = m.session();
        assert!(s.lift.z > 0.0);
        assert!(s.lift.x.abs() < 1e-9 * s.lift.z);
        assert!(s.drag.x > 0.0);
        // angle of attack is the complement of the elevation
        assert!((s.alpha_deg - (90.0 - 70.7)).abs() < 1e-9);
    }

    #[test]
    fn steering_pushes_sideways() {
        let mut m = model();
        m.set_steering(0.5);
        let (y, yd) = m.steady_state(&vec![0.0; 12]).unwrap();
        let mut res = vec![0.0; 36];
        m.residual(&y, &yd, 0.0, &mut res).unwrap();
        // positive input steers towards -y
        let kite_acc_y = -res[m.layout().vel(5) + 1];
        assert!(kite_acc_y < 0.0);
    }

    #[test]
    fn kite_below_ground_diverges() {
        let mut m = model();
        let (mut y, yd) = m.steady_state(&vec![0.0; 12]).unwrap();
        for f in 0..6 {
            y[m.layout().pos(f) + 2] = -1.0;
        }
        let mut res = vec![0.0; 36];
        let err = m.residual(&y, &yd, 0.0, &mut res).unwrap_err();
        assert!(matches!(err, ModelError::Diverged { .. }));
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let mut m = model();
        let mut res = vec![0.0; 36];
        let err = m.residual(&[0.0; 35], &[0.0; 36], 0.0, &mut res).unwrap_err();
        assert!(matches!(err, ModelError::Dimension { what: "y", .. }));
    }
}
