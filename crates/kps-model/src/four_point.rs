//! Four-point kite model: a single tether of `N` segments ending in the kite
//! control unit, which carries the kite on a bridle.
//!
//! The kite is resolved into an apex, a trailing edge particle and two wing
//! tips, held in shape by kite springs. Its aerodynamics are those of the
//! lumped kite: the angle of attack follows the top tether segment, the lift
//! axis follows the wing tips, and the load is shared by the four particles.
//!
//! Particles: ground `0`, tether nodes `1..=N` (`N` is the control unit),
//! apex `N+1`, trailing edge `N+2`, tips `N+3` (left) and `N+4` (right).
//! The tether length is integrated from the reel-out speed as in the
//! one-point model.

use crate::error::{ModelError, ModelResult, check_dimension};
use crate::forces::segment_force;
use crate::frame::KiteFrame;
use crate::layout::{LEFT, RIGHT, StateLayout, read_vec3, write_vec3};
use crate::model::{
    ACCEPT_NORM, KiteModel, MIN_APPARENT_WIND, ensure_finite_residual, environment_from_settings,
    norm, require,
};
use crate::one_point::{KiteParams, PointKite};
use crate::particles::{Particles, Spring, SpringKind, TetherParams};
use crate::session::SessionState;
use kps_aero::AeroPolar;
use kps_config::{FourPointDef, Settings};
use kps_core::{Vec3, deg, pid, radians, try_normalize};
use kps_env::{Environment, StandardEnvironment};

/// Kite particles in layout order, starting at `N + 1`.
const APEX: usize = 0;
const TRAILING: usize = 1;
const TIP_LEFT: usize = 2;
const TIP_RIGHT: usize = 3;

/// Kite spring pairs between `[control unit, apex, trailing, left, right]`.
const KITE_SPRINGS: [(usize, usize); 10] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (1, 2),
    (1, 3),
    (1, 4),
    (2, 3),
    (2, 4),
    (3, 4),
];

/// Shape of the kite and its bridle.
#[derive(Clone, Debug, PartialEq)]
pub struct KiteBody {
    pub h_bridle: f64,
    pub height: f64,
    pub half_width: f64,
    pub depth: f64,
}

impl KiteBody {
    pub fn from_settings(fp: &FourPointDef) -> Self {
        Self {
            h_bridle: fp.h_bridle,
            height: fp.height,
            half_width: 0.5 * fp.width,
            depth: fp.depth,
        }
    }

    /// Kite particle positions relative to the control unit, in the order
    /// apex, trailing edge, left tip, right tip.
    pub fn offsets(&self, frame: &KiteFrame) -> [Vec3; 4] {
        let middle = -self.h_bridle * frame.e_z;
        let mut out = [middle; 4];
        out[APEX] -= self.height * frame.e_z;
        out[TRAILING] -= self.depth * frame.e_x;
        out[TIP_LEFT] += self.half_width * frame.e_y;
        out[TIP_RIGHT] -= self.half_width * frame.e_y;
        out
    }

    /// Unstressed lengths of the kite springs.
    fn spring_lengths(&self) -> [f64; 10] {
        let frame = KiteFrame {
            e_x: Vec3::x(),
            e_y: Vec3::y(),
            e_z: Vec3::z(),
        };
        let o = self.offsets(&frame);
        let points = [Vec3::zeros(), o[0], o[1], o[2], o[3]];
        KITE_SPRINGS.map(|(a, b)| (points[a] - points[b]).norm())
    }
}

pub struct FourPointModel {
    layout: StateLayout,
    env: StandardEnvironment,
    polar: AeroPolar,
    tether: TetherParams,
    kite: KiteParams,
    body: KiteBody,
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

impl FourPointModel {
    pub fn new(settings: &Settings) -> ModelResult<Self> {
        let segments = settings.system.segments;
        require(segments > 0, "four-point model needs at least one segment")?;
        require(
            settings.tether.l_tether > 0.0,
            "tether length must be positive",
        )?;
        require(settings.kite.area > 0.0, "kite area must be positive")?;
        let fp = &settings.four_point;
        require(
            fp.h_bridle > 0.0 && fp.height > 0.0 && fp.width > 0.0 && fp.depth > 0.0,
            "four-point kite dimensions must be positive",
        )?;

        let aero = &settings.aero;
        let polar = AeroPolar::new(&aero.alpha_cl, &aero.cl_list, &aero.alpha_cd, &aero.cd_list)?;
        let tether = TetherParams::from_settings(&settings.tether);
        let layout = StateLayout::four_point(segments);
        let body = KiteBody::from_settings(fp);

        let mut springs: Vec<Spring> = (0..segments)
            .map(|i| Spring::new(pid(i), pid(i + 1), SpringKind::Tether, tether.diameter))
            .collect();
        for ((a, b), length) in KITE_SPRINGS.into_iter().zip(body.spring_lengths()) {
            let (p1, p2) = (pid(segments + a), pid(segments + b));
            let mut spring = Spring::new(p1, p2, SpringKind::Kite, 0.0);
            spring.set_length(length, tether.unit_stiffness, tether.unit_damping);
            springs.push(spring);
        }

        let mut model = Self {
            env: environment_from_settings(&settings.environment),
            polar,
            tether,
            kite: KiteParams::from_settings(&settings.kite),
            body,
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

    pub fn body(&self) -> &KiteBody {
        &self.body
    }

    pub fn set_depower(&mut self, depower: f64) {
        self.session.depower = depower;
    }

    fn radial(&self) -> Vec3 {
        Vec3::new(self.elevation.cos(), 0.0, self.elevation.sin())
    }

    /// Layout indices of the four kite particles.
    fn kite_particles(&self) -> [usize; 4] {
        let first = self.layout.apex();
        [first, first + 1, first + 2, first + 3]
    }

    /// Straight tether of length `length` along the elevation, kite upright
    /// on top.
    fn reference_positions(&self, length: f64) -> ModelResult<Vec<Vec3>> {
        let n = self.layout.segments();
        let radial = self.radial();
        let frame = KiteFrame::upright(&radial)?;
        let mut positions: Vec<Vec3> = (0..=n)
            .map(|i| i as f64 / n as f64 * length * radial)
            .collect();
        let kcu = positions[n];
        positions.extend(self.body.offsets(&frame).iter().map(|o| kcu + o));
        Ok(positions)
    }

    /// Tether springs and masses for the current segment length; the kite
    /// springs keep their shape.
    fn update_segments(&mut self, seg_len: f64) {
        let n = self.layout.segments();
        for spring in self.springs.iter_mut().take(n) {
            spring.set_length(seg_len, self.tether.unit_stiffness, self.tether.unit_damping);
        }
        let m_seg = self.tether.segment_mass(seg_len, self.tether.diameter);
        let kite = self.kite_particles();
        let mass = &mut self.particles.mass;
        for m in &mut mass[1..n] {
            *m = m_seg;
        }
        mass[n] = self.kite.kcu_mass + 0.5 * m_seg;
        for p in kite {
            mass[p] = 0.25 * self.kite.mass;
        }
    }

    /// Lumped kite aerodynamics at the kite centre, shared by the kite
    /// particles; the steering force acts on the tips.
    fn aero_forces(&mut self, frame: &KiteFrame) -> ModelResult<()> {
        let n = self.layout.segments();
        let kite = self.kite_particles();
        let centre = kite.iter().map(|&p| self.particles.pos[p]).sum::<Vec3>() / 4.0;
        let velocity = kite.iter().map(|&p| self.particles.vel[p]).sum::<Vec3>() / 4.0;
        let wind = self.env.wind_at(centre.z);
        let rho = self.env.air_density(centre.z);
        let v_app = wind - velocity;
        self.session.v_wind_kite = wind;
        self.session.rho = rho;
        self.session.v_apparent = v_app;

        if v_app.norm() < MIN_APPARENT_WIND {
            self.session.lift = Vec3::zeros();
            self.session.drag = Vec3::zeros();
            return Ok(());
        }

        let z = try_normalize(
            &(self.particles.pos[n - 1] - self.particles.pos[n]),
            "tether z axis",
        )?;
        let aero = self.kite.point_forces(
            &self.polar,
            self.alpha_zero,
            &PointKite {
                pos: centre,
                v_app,
                rho,
                z,
                y: frame.e_y,
                steering: self.session.steering,
                depower: self.session.depower,
            },
        )?;

        let share = 0.25 * (aero.lift + aero.drag);
        for p in kite {
            self.forces[p] += share;
        }
        for side in [LEFT, RIGHT] {
            self.forces[self.layout.tip(side)] += 0.5 * aero.steering;
        }

        self.session.lift = aero.lift;
        self.session.drag = aero.drag;
        self.session.alpha_deg = aero.alpha_deg;
        Ok(())
    }
}

impl KiteModel for FourPointModel {
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
        self.particles.pos = self.reference_positions(self.initial_length)?;
        self.particles.vel.iter_mut().for_each(|v| *v = Vec3::zeros());
        self.forces.iter_mut().for_each(|f| *f = Vec3::zeros());
        self.session.last_positions.clone_from(&self.particles.pos);
        self.frame = Some(KiteFrame::upright(&self.radial())?);
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
        let length = self.session.tether_length_at(time);
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
        for f in 0..self.layout.free_particles() {
            let p = self.layout.particle_of(f);
            self.particles.pos[p] = read_vec3(y, self.layout.pos(f));
            self.particles.vel[p] = read_vec3(y, self.layout.vel(f));
        }
        let frame = KiteFrame::from_points(
            &self.particles.pos[self.layout.apex()],
            &self.particles.pos[self.layout.tip(LEFT)],
            &self.particles.pos[self.layout.tip(RIGHT)],
        )?;

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
        self.aero_forces(&frame)?;

        for f in 0..self.layout.free_particles() {
            let p = self.layout.particle_of(f);
            let (ip, iv) = (self.layout.pos(f), self.layout.vel(f));
            let res1 = self.particles.vel[p] - read_vec3(yd, ip);
            let res2 = read_vec3(yd, iv)
                - (self.gravity + self.forces[p] / self.particles.mass[p]);
            write_vec3(res, ip, &res1);
            write_vec3(res, iv, &res2);
        }
        ensure_finite_residual(res)?;

        self.frame = Some(frame);
        if norm(res) < ACCEPT_NORM {
            self.session.last_positions.clone_from(&self.particles.pos);
        }
        self.session.iterations += 1;
        Ok(())
    }

    fn steady_param_count(&self) -> usize {
        3 * self.layout.free_particles()
    }

    fn steady_state(&self, x: &[f64]) -> ModelResult<(Vec<f64>, Vec<f64>)> {
        let layout = &self.layout;
        let n = layout.segments();
        let free = layout.free_particles();
        check_dimension("steady parameters", 3 * free, x.len())?;

        let positions = self.reference_positions(self.session.l_tether)?;
        let radial = self.radial();
        let mut y = vec![0.0; layout.len()];
        let mut yd = vec![0.0; layout.len()];
        for f in 0..free {
            let p = layout.particle_of(f);
            let frac = p.min(n) as f64 / n as f64;
            let offset = Vec3::new(x[3 * f], x[3 * f + 1], x[3 * f + 2]);
            let vel = frac * self.session.v_reel_out * radial;
            write_vec3(&mut y, layout.pos(f), &(positions[p] + offset));
            write_vec3(&mut y, layout.vel(f), &vel);
            write_vec3(&mut yd, layout.pos(f), &vel);
        }
        Ok((y, yd))
    }

    fn steady_equations(&self, res: &[f64]) -> Vec<f64> {
        let start = self.layout.vel(0);
        res[start..start + 3 * self.layout.free_particles()].to_vec()
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
    use kps_config::ModelKind;

    fn settings() -> Settings {
        let mut s = Settings::default();
        s.system.model = ModelKind::FourPoint;
        s.tether.l_tether = 392.0;
        s
    }

    fn evaluate(m: &mut FourPointModel) -> Vec<f64> {
        let x = vec![0.0; m.steady_param_count()];
        let (y, yd) = m.steady_state(&x).unwrap();
        let mut res = vec![0.0; m.layout().len()];
        m.residual(&y, &yd, 0.0, &mut res).unwrap();
        res
    }

    #[test]
    fn kite_sits_upright_on_the_bridle() {
        let m = FourPointModel::new(&settings()).unwrap();
        let l = m.layout();
        let pos = m.positions();
        let kcu = pos[l.bridle_point()];
        assert!((kcu.norm() - 392.0).abs() < 1e-9);

        let frame = KiteFrame::from_points(&pos[l.apex()], &pos[l.tip(LEFT)], &pos[l.tip(RIGHT)])
            .unwrap();
        let upright = KiteFrame::upright(&kcu.normalize()).unwrap();
        assert!((frame.e_z - upright.e_z).norm() < 1e-12);
        assert!((frame.e_y - Vec3::y()).norm() < 1e-12);
        assert!(((pos[l.tip(LEFT)] - pos[l.tip(RIGHT)]).norm() - 5.77).abs() < 1e-9);
        // apex is the highest kite particle
        let apex_h = pos[l.apex()].z;
        assert!(apex_h > pos[l.trailing_edge()].z && apex_h > pos[l.tip(LEFT)].z);
    }

    #[test]
    fn mass_matches_lumped_kite() {
        let m = FourPointModel::new(&settings()).unwrap();
        let n = m.layout().segments();
        let top: f64 = m.particles.mass[n..].iter().sum();
        let m_seg = m.tether.segment_mass(392.0 / 6.0, 0.004);
        assert!((top - (6.2 + 8.4 + 0.5 * m_seg)).abs() < 1e-12);
    }

    #[test]
    fn kite_springs_are_relaxed_at_rest() {
        let mut s = settings();
        s.environment.v_wind = 0.0;
        let mut m = FourPointModel::new(&s).unwrap();
        let res = evaluate(&mut m);
        let layout = m.layout().clone();
        // kite particles only feel gravity
        for p in m.kite_particles() {
            let f = layout.free_index_of(p).unwrap();
            let r = read_vec3(&res, layout.vel(f));
            assert!((r - Vec3::new(0.0, 0.0, 9.81)).norm() < 1e-6, "p = {p}: {r}");
        }
        assert_eq!(m.lift_drag(), (0.0, 0.0));
    }

    #[test]
    fn load_is_shared_by_the_kite_particles() {
        let mut m = FourPointModel::new(&settings()).unwrap();
        let res = evaluate(&mut m);
        let (lift, drag) = m.lift_drag();
        assert!(lift > 3.0 * drag && drag > 0.0);
        // kinematic equations hold exactly
        let free = m.layout().free_particles();
        assert!(res[..3 * free].iter().all(|r| *r == 0.0));

        let layout = m.layout().clone();
        let acc = |p: usize| read_vec3(&res, layout.vel(layout.free_index_of(p).unwrap()));
        // same mass and same share of the load: the trailing edge and the
        // tips differ only by spring forces, which vanish at rest length
        let a = acc(layout.apex());
        for p in [layout.trailing_edge(), layout.tip(LEFT), layout.tip(RIGHT)] {
            assert!((acc(p) - a).norm() < 1e-6 * a.norm(), "p = {p}");
        }
    }

    #[test]
    fn angle_of_attack_follows_the_tether() {
        let mut reference = Settings::default();
        reference.tether.l_tether = 392.0;
        let mut one = crate::OnePointModel::new(&reference).unwrap();
        let x = vec![0.0; one.steady_param_count()];
        let (y, yd) = one.steady_state(&x).unwrap();
        let mut res = vec![0.0; one.layout().len()];
        one.residual(&y, &yd, 0.0, &mut res).unwrap();

        let mut four = FourPointModel::new(&settings()).unwrap();
        evaluate(&mut four);
        assert!((four.session().alpha_deg - one.session().alpha_deg).abs() < 1e-9);
    }

    #[test]
    fn steering_pushes_the_tips_sideways() {
        let mut m = FourPointModel::new(&settings()).unwrap();
        m.set_steering(0.5);
        let res = evaluate(&mut m);
        let layout = m.layout().clone();
        let tip = layout.free_index_of(layout.tip(LEFT)).unwrap();
        // positive input steers towards -y
        assert!(-res[layout.vel(tip) + 1] < 0.0);
        let apex = layout.free_index_of(layout.apex()).unwrap();
        assert!(res[layout.vel(apex) + 1].abs() < 1e-9);
    }

    #[test]
    fn clear_comes_to_rest_while_reeling() {
        let mut s = settings();
        s.initial.v_reel_out = 2.0;
        let mut m = FourPointModel::new(&s).unwrap();
        m.set_v_reel_out(1.0, 3.0);
        m.clear().unwrap();
        assert!(m.particles.vel.iter().all(|v| *v == Vec3::zeros()));
        assert_eq!(m.session().l_tether, 392.0);

        // reeling out at the initial speed from the start
        m.set_v_reel_out(2.0, 1.0);
        assert!((m.tether_lengths()[0] - 394.0).abs() < 1e-12);
    }

    #[test]
    fn collapsed_kite_diverges() {
        let mut m = FourPointModel::new(&settings()).unwrap();
        let x = vec![0.0; m.steady_param_count()];
        let (mut y, yd) = m.steady_state(&x).unwrap();
        let layout = m.layout().clone();
        let right = layout.pos(layout.free_index_of(layout.tip(RIGHT)).unwrap());
        let left = layout.pos(layout.free_index_of(layout.tip(LEFT)).unwrap());
        for k in 0..3 {
            y[right + k] = y[left + k];
        }
        let mut res = vec![0.0; layout.len()];
        let err = m.residual(&y, &yd, 0.0, &mut res).unwrap_err();
        assert!(matches!(err, ModelError::Diverged { .. }));
    }
}
