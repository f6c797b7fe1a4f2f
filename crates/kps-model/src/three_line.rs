//! Three-line kite model.
//!
//! A middle tether holds the kite apex `E`; two steering lines end in
//! connection particles that slide along `e_z` on the wing tips `C` (left)
//! and `D` (right). The slide coordinate `ζ` is the trailing edge deflection
//! of that kite half. Line lengths and reel-out speeds are state variables,
//! driven by one winch per line.
//!
//! Particles: ground `0, 1, 2` (left, right, middle); tether level `k` uses
//! `3k, 3k+1, 3k+2`; at `k = N` these are the two connections and `E`;
//! `C = 3N+3`, `D = 3N+4`.

use crate::error::{ModelError, ModelResult, check_dimension};
use crate::forces::segment_force;
use crate::frame::KiteFrame;
use crate::layout::{LEFT, MIDDLE, RIGHT, StateLayout, read_vec3, write_vec3};
use crate::model::{
    ACCEPT_NORM, KiteModel, MIN_APPARENT_WIND, ensure_finite_residual, environment_from_settings,
    norm, require,
};
use crate::particles::{Particles, Spring, SpringKind, TetherParams};
use crate::session::SessionState;
use crate::winch::{AsyncMachine, WinchModel, WinchSetpoint};
use kps_aero::AeroPolar;
use kps_config::{Settings, ThreeLineDef};
use kps_core::{Vec3, deg, meters, mm, pid, radians, try_normalize};
use kps_env::{Environment, StandardEnvironment};
use std::f64::consts::{FRAC_PI_2, PI};

/// Arc-shaped kite geometry and force split.
#[derive(Clone, Debug, PartialEq)]
pub struct KiteGeometry {
    pub radius: f64,
    pub middle_chord: f64,
    pub tip_chord: f64,
    /// Samples per kite half
    pub surfaces: usize,
    pub steering_fraction: f64,
    pub apex_share: f64,
    /// Arc angle of the left tip; the right tip sits at `π - alpha_0`
    pub alpha_0: f64,
    /// Bounds of the central zone where the deflection is blended
    pub alpha_l: f64,
    pub alpha_r: f64,
    /// Distance of the tips below the apex along `e_z`
    pub height: f64,
    /// Distance of each tip from the symmetry plane
    pub half_span: f64,
}

impl KiteGeometry {
    pub fn from_settings(tl: &ThreeLineDef) -> Self {
        let alpha_0 = FRAC_PI_2 - tl.width / (2.0 * tl.radius);
        let dead = tl.min_steering_line_distance / (2.0 * tl.radius);
        Self {
            radius: tl.radius,
            middle_chord: tl.middle_length,
            tip_chord: tl.tip_length,
            surfaces: tl.aero_surfaces,
            steering_fraction: tl.steering_fraction,
            apex_share: tl.apex_share,
            alpha_0,
            alpha_l: FRAC_PI_2 - dead,
            alpha_r: FRAC_PI_2 + dead,
            height: tl.radius * (1.0 - alpha_0.sin()),
            half_span: tl.radius * alpha_0.cos(),
        }
    }

    /// Tip position relative to the apex.
    pub fn tip_offset(&self, frame: &KiteFrame, side: usize) -> Vec3 {
        let sign = if side == LEFT { 1.0 } else { -1.0 };
        self.height * frame.e_z + sign * self.half_span * frame.e_y
    }

    /// Angular width of one sample.
    pub fn d_alpha(&self) -> f64 {
        (PI - 2.0 * self.alpha_0) / (2 * self.surfaces) as f64
    }

    /// Trailing edge deflection at arc angle `alpha`: the tip values outside
    /// the central zone, linear in between.
    pub fn deflection(&self, alpha: f64, zeta: [f64; 2]) -> f64 {
        if alpha <= self.alpha_l {
            zeta[LEFT]
        } else if alpha >= self.alpha_r {
            zeta[RIGHT]
        } else {
            let t = (alpha - self.alpha_l) / (self.alpha_r - self.alpha_l);
            zeta[LEFT] + (zeta[RIGHT] - zeta[LEFT]) * t
        }
    }

    /// 0 at the apex, 1 at the tip.
    fn span_fraction(&self, alpha: f64) -> f64 {
        (alpha - FRAC_PI_2).abs() / (FRAC_PI_2 - self.alpha_0)
    }
}

/// Reference configuration: straight lines at the initial elevation.
struct InitialGeometry {
    positions: Vec<Vec3>,
    lengths: [f64; 3],
    kite_springs: [f64; 3],
}

pub struct ThreeLineModel {
    layout: StateLayout,
    env: StandardEnvironment,
    polar: AeroPolar,
    tether: TetherParams,
    geometry: KiteGeometry,
    winch: Box<dyn WinchModel>,
    kite_mass: f64,
    connection_mass: f64,
    d_steering: f64,
    alpha_zero: f64,
    gravity: Vec3,
    elevation: f64,
    initial_length: f64,
    initial_v_reel_out: f64,
    particles: Particles,
    springs: Vec<Spring>,
    forces: Vec<Vec3>,
    /// Force on each connection along `e_z`, gravity included
    axial: [f64; 2],
    frame: Option<KiteFrame>,
    session: SessionState,
}

impl ThreeLineModel {
    pub fn new(settings: &Settings) -> ModelResult<Self> {
        let segments = settings.system.segments;
        require(segments >= 2, "three-line model needs at least two segments")?;
        let tl = &settings.three_line;
        require(tl.aero_surfaces > 0, "three-line kite needs aero surfaces")?;
        require(
            tl.width > 0.0 && tl.width / (2.0 * tl.radius) < FRAC_PI_2,
            "kite arc must span less than a half circle",
        )?;

        let aero = &settings.aero;
        let polar = AeroPolar::new(&aero.alpha_cl, &aero.cl_list, &aero.alpha_cd, &aero.cd_list)?;
        let tether = TetherParams::from_settings(&settings.tether);
        let layout = StateLayout::three_line(segments);
        let d_steering = meters(mm(tl.d_steering_mm));

        let mut springs: Vec<Spring> = (0..3 * segments)
            .map(|j| {
                let diameter = if j % 3 == MIDDLE { tether.diameter } else { d_steering };
                Spring::new(pid(j), pid(j + 3), SpringKind::Tether, diameter)
            })
            .collect();
        let (e, c, d) = (layout.apex(), layout.tip(LEFT), layout.tip(RIGHT));
        for (p1, p2) in [(e, c), (e, d), (c, d)] {
            springs.push(Spring::new(pid(p1), pid(p2), SpringKind::Kite, 0.0));
        }

        let mut model = Self {
            env: environment_from_settings(&settings.environment),
            polar,
            geometry: KiteGeometry::from_settings(tl),
            winch: Box::new(AsyncMachine::from_settings(&settings.winch)),
            kite_mass: settings.kite.mass,
            connection_mass: tl.connection_mass,
            d_steering,
            alpha_zero: aero.alpha_zero,
            gravity: Vec3::new(0.0, 0.0, -settings.system.g_earth),
            elevation: radians(deg(settings.initial.elevation_deg)),
            initial_length: settings.tether.l_tether,
            initial_v_reel_out: settings.initial.v_reel_out,
            particles: Particles::new(layout.particle_count()),
            forces: vec![Vec3::zeros(); layout.particle_count()],
            springs,
            tether,
            axial: [0.0; 2],
            frame: None,
            session: SessionState::new(layout.particle_count(), 3),
            layout,
        };
        model.clear()?;
        Ok(model)
    }

    /// Replace the winch used for all three lines.
    pub fn with_winch(mut self, winch: Box<dyn WinchModel>) -> Self {
        self.winch = winch;
        self
    }

    pub fn geometry(&self) -> &KiteGeometry {
        &self.geometry
    }

    pub fn set_winch_setpoints(&mut self, setpoints: [WinchSetpoint; 3]) {
        self.session.setpoints = setpoints.to_vec();
    }

    fn radial(&self) -> Vec3 {
        Vec3::new(self.elevation.cos(), 0.0, self.elevation.sin())
    }

    fn initial_geometry(&self) -> ModelResult<InitialGeometry> {
        let n = self.layout.segments();
        let radial = self.radial();
        let frame = KiteFrame::upright(&radial)?;

        let mut positions = vec![Vec3::zeros(); self.layout.particle_count()];
        let apex = self.initial_length * radial;
        let ends = [
            apex + self.geometry.tip_offset(&frame, LEFT),
            apex + self.geometry.tip_offset(&frame, RIGHT),
            apex,
        ];
        for k in 1..=n {
            let frac = k as f64 / n as f64;
            for line in [LEFT, RIGHT, MIDDLE] {
                positions[3 * k + line] = frac * ends[line];
            }
        }
        positions[self.layout.tip(LEFT)] = ends[LEFT];
        positions[self.layout.tip(RIGHT)] = ends[RIGHT];

        let e_c = self.geometry.tip_offset(&frame, LEFT).norm();
        Ok(InitialGeometry {
            lengths: [ends[LEFT].norm(), ends[RIGHT].norm(), self.initial_length],
            kite_springs: [e_c, e_c, 2.0 * self.geometry.half_span],
            positions,
        })
    }

    /// Stiffness and damping scale with the cross section of the line.
    fn line_scale(&self, line: usize) -> f64 {
        if line == MIDDLE {
            1.0
        } else {
            (self.d_steering / self.tether.diameter).powi(2)
        }
    }

    fn line_diameter(&self, line: usize) -> f64 {
        if line == MIDDLE {
            self.tether.diameter
        } else {
            self.d_steering
        }
    }

    /// Per-line segment lengths, stiffness and lumped masses.
    fn update_segments(&mut self, lengths: [f64; 3]) {
        let n = self.layout.segments();
        let seg_len = lengths.map(|l| l / n as f64);
        let scale = [LEFT, RIGHT, MIDDLE].map(|line| self.line_scale(line));
        let m_seg = [LEFT, RIGHT, MIDDLE]
            .map(|line| self.tether.segment_mass(seg_len[line], self.line_diameter(line)));

        for (j, spring) in self.springs.iter_mut().take(3 * n).enumerate() {
            let line = j % 3;
            spring.set_length(
                seg_len[line],
                scale[line] * self.tether.unit_stiffness,
                scale[line] * self.tether.unit_damping,
            );
        }

        let mass = &mut self.particles.mass;
        for p in 3..3 * n {
            mass[p] = m_seg[p % 3];
        }
        mass[self.layout.apex()] = 0.5 * self.kite_mass + 0.5 * m_seg[MIDDLE];
        for side in [LEFT, RIGHT] {
            mass[self.layout.tip(side)] = 0.25 * self.kite_mass;
            mass[self.layout.connection(side)] = self.connection_mass + 0.5 * m_seg[side];
        }
    }

    fn set_kite_springs(&mut self, rest: [f64; 3]) {
        let n = self.layout.segments();
        for (spring, length) in self.springs[3 * n..].iter_mut().zip(rest) {
            spring.set_length(length, self.tether.unit_stiffness, self.tether.unit_damping);
        }
    }

    /// Lift and drag of the arc, sampled per half and split between the
    /// connection, the apex and the tip of that half.
    fn aero_forces(&mut self, frame: &KiteFrame) -> ModelResult<()> {
        let g = &self.geometry;
        let apex = self.layout.apex();
        let height = self.particles.pos[apex].z;
        let wind = self.env.wind_at(height);
        let rho = self.env.air_density(height);
        let v_apex = self.particles.vel[apex];
        self.session.v_wind_kite = wind;
        self.session.v_apparent = wind - v_apex;
        self.session.rho = rho;

        let zeta = self.session.deflections;
        let d_alpha = g.d_alpha();
        let mut lift = [Vec3::zeros(); 2];
        let mut drag = [Vec3::zeros(); 2];
        let mut alpha_sum = 0.0;
        let mut samples = 0usize;

        for i in 0..2 * g.surfaces {
            let alpha = g.alpha_0 + (i as f64 + 0.5) * d_alpha;
            let side = if alpha < FRAC_PI_2 { LEFT } else { RIGHT };
            let frac = g.span_fraction(alpha);
            let chord = g.middle_chord + (g.tip_chord - g.middle_chord) * frac;
            let v_tip = self.particles.vel[self.layout.tip(side)];
            let v_local = v_apex + (v_tip - v_apex) * frac;

            let e_r = alpha.cos() * frame.e_y - alpha.sin() * frame.e_z;
            let e_drift = e_r.cross(&frame.e_x);
            let v_a = wind - v_local;
            let v_xr = v_a - v_a.dot(&e_drift) * e_drift;
            let speed = v_xr.norm();
            if speed < MIN_APPARENT_WIND {
                continue;
            }

            let deflection = g.deflection(alpha, zeta);
            let aoa = PI - (v_xr.dot(&frame.e_x) / speed).clamp(-1.0, 1.0).acos()
                + (deflection / chord).clamp(-1.0, 1.0).asin();
            let aoa_deg = aoa.to_degrees() + self.alpha_zero;
            let (cl, cd) = self.polar.coefficients(aoa_deg);

            let area = chord * g.radius * d_alpha;
            let lift_dir = try_normalize(&e_drift.cross(&v_xr), "lift direction")?;
            lift[side] += 0.5 * rho * speed * speed * area * cl * lift_dir;
            drag[side] += 0.5 * rho * speed * area * cd * v_xr;
            alpha_sum += aoa_deg;
            samples += 1;
        }

        for side in [LEFT, RIGHT] {
            let outward = -frame.e_z;
            let steer = g.steering_fraction * lift[side].dot(&outward) * outward;
            let rest = lift[side] + drag[side] - steer;
            self.forces[self.layout.connection(side)] += steer;
            self.forces[apex] += g.apex_share * rest;
            self.forces[self.layout.tip(side)] += (1.0 - g.apex_share) * rest;
        }

        self.session.lift = lift[LEFT] + lift[RIGHT];
        self.session.drag = drag[LEFT] + drag[RIGHT];
        if samples > 0 {
            self.session.alpha_deg = alpha_sum / samples as f64;
        }
        Ok(())
    }

    /// Split each connection force: the part across `e_z` is carried by the
    /// companion tip, the part along `e_z` drives the slide coordinate.
    fn transfer_connection_forces(&mut self, frame: &KiteFrame) {
        for side in [LEFT, RIGHT] {
            let c = self.layout.connection(side);
            let total = self.forces[c] + self.particles.mass[c] * self.gravity;
            let axial = total.dot(&frame.e_z);
            self.forces[self.layout.tip(side)] += total - axial * frame.e_z;
            self.forces[c] = Vec3::zeros();
            self.axial[side] = axial;
        }
    }
}

impl KiteModel for ThreeLineModel {
    fn layout(&self) -> &StateLayout {
        &self.layout
    }

    fn clear(&mut self) -> ModelResult<()> {
        let init = self.initial_geometry()?;
        let ground_wind = self.env.ground_wind();
        let rho = self.env.air_density(0.0);
        self.session
            .reset(ground_wind, rho, &init.lengths, self.initial_v_reel_out);

        self.set_kite_springs(init.kite_springs);
        self.update_segments(init.lengths);
        self.particles.pos.clone_from(&init.positions);
        self.particles.vel.iter_mut().for_each(|v| *v = Vec3::zeros());
        self.forces.iter_mut().for_each(|f| *f = Vec3::zeros());
        self.axial = [0.0; 2];
        self.session.last_positions.clone_from(&self.particles.pos);
        self.frame = Some(KiteFrame::upright(&self.radial())?);
        Ok(())
    }

    fn residual(
        &mut self,
        y: &[f64],
        yd: &[f64],
        _time: f64,
        res: &mut [f64],
    ) -> ModelResult<()> {
        let dim = self.layout.len();
        check_dimension("y", dim, y.len())?;
        check_dimension("yd", dim, yd.len())?;
        check_dimension("res", dim, res.len())?;

        let layout = self.layout.clone();
        let mut lengths = [0.0; 3];
        for line in [LEFT, RIGHT, MIDDLE] {
            let l = y[layout.length(line)];
            if !(l > 0.0) {
                return Err(ModelError::Diverged {
                    what: "line length",
                    value: l,
                });
            }
            lengths[line] = l;
            self.session.lengths[line] = l;
            self.session.reel_speeds[line] = y[layout.speed(line)];
        }
        self.update_segments(lengths);

        for p in [LEFT, RIGHT, MIDDLE] {
            self.particles.pos[p] = Vec3::zeros();
            self.particles.vel[p] = Vec3::zeros();
        }
        for f in 0..layout.free_particles() {
            let p = layout.particle_of(f);
            self.particles.pos[p] = read_vec3(y, layout.pos(f));
            self.particles.vel[p] = read_vec3(y, layout.vel(f));
        }

        let frame = KiteFrame::from_points(
            &self.particles.pos[layout.apex()],
            &self.particles.pos[layout.tip(LEFT)],
            &self.particles.pos[layout.tip(RIGHT)],
        )?;
        for side in [LEFT, RIGHT] {
            let tip = layout.tip(side);
            let zeta = y[layout.zeta(side)];
            let c = layout.connection(side);
            self.particles.pos[c] = self.particles.pos[tip] + zeta * frame.e_z;
            self.particles.vel[c] = self.particles.vel[tip] + y[layout.zeta_dot(side)] * frame.e_z;
            self.session.deflections[side] = zeta;
        }

        self.forces.iter_mut().for_each(|f| *f = Vec3::zeros());
        for (j, spring) in self.springs.iter().enumerate() {
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
            if j < 3 {
                self.session.winch_forces[j] = self.forces[j].norm();
            }
        }
        self.session.v_wind_tether = self
            .env
            .wind_at(0.5 * self.particles.pos[layout.apex()].z);

        self.aero_forces(&frame)?;
        self.transfer_connection_forces(&frame);

        for f in 0..layout.free_particles() {
            let p = layout.particle_of(f);
            let (ip, iv) = (layout.pos(f), layout.vel(f));
            let res1 = self.particles.vel[p] - read_vec3(yd, ip);
            let res2 = read_vec3(yd, iv)
                - (self.gravity + self.forces[p] / self.particles.mass[p]);
            write_vec3(res, ip, &res1);
            write_vec3(res, iv, &res2);
        }

        for side in [LEFT, RIGHT] {
            let (iz, izd) = (layout.zeta(side), layout.zeta_dot(side));
            let c = layout.connection(side);
            let tip = layout.tip(side);
            let tip_free = layout
                .free_index_of(tip)
                .ok_or_else(|| ModelError::Config {
                    what: "wing tip is not a free particle".to_string(),
                })?;
            let a_tip = read_vec3(yd, layout.vel(tip_free));
            res[iz] = yd[iz] - y[izd];
            res[izd] = yd[izd]
                - (self.axial[side] / self.particles.mass[c] - a_tip.dot(&frame.e_z));
        }

        for line in [LEFT, RIGHT, MIDDLE] {
            let (il, iv) = (layout.length(line), layout.speed(line));
            let speed = y[iv];
            res[il] = yd[il] - speed;
            res[iv] = yd[iv]
                - self.winch.acceleration(
                    speed,
                    self.session.winch_forces[line],
                    self.session.setpoints[line],
                    true,
                );
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
        3 * self.layout.free_particles() + 2
    }

    fn steady_state(&self, x: &[f64]) -> ModelResult<(Vec<f64>, Vec<f64>)> {
        let layout = &self.layout;
        let free = layout.free_particles();
        check_dimension("steady parameters", 3 * free + 2, x.len())?;

        let init = self.initial_geometry()?;
        let n = layout.segments();
        let radial = self.radial();
        let v_reel = self.session.v_reel_out;
        let mut y = vec![0.0; layout.len()];
        let mut yd = vec![0.0; layout.len()];

        for f in 0..free {
            let p = layout.particle_of(f);
            let level = if p >= 3 * n { n } else { p / 3 };
            let offset = Vec3::new(x[3 * f], x[3 * f + 1], x[3 * f + 2]);
            let vel = v_reel * level as f64 / n as f64 * radial;
            write_vec3(&mut y, layout.pos(f), &(init.positions[p] + offset));
            write_vec3(&mut y, layout.vel(f), &vel);
            write_vec3(&mut yd, layout.pos(f), &vel);
        }
        for side in [LEFT, RIGHT] {
            y[layout.zeta(side)] = x[3 * free + side];
        }
        for line in [LEFT, RIGHT, MIDDLE] {
            y[layout.length(line)] = self.session.lengths[line];
            y[layout.speed(line)] = v_reel;
            yd[layout.length(line)] = v_reel;
        }
        Ok((y, yd))
    }

    fn steady_equations(&self, res: &[f64]) -> Vec<f64> {
        let layout = &self.layout;
        let free = layout.free_particles();
        let start = layout.vel(0);
        let mut out = res[start..start + 3 * free].to_vec();
        out.push(res[layout.zeta_dot(LEFT)]);
        out.push(res[layout.zeta_dot(RIGHT)]);
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
        let s = &mut self.session;
        s.last_v_reel_out = s.v_reel_out;
        s.v_reel_out = v_reel_out;
        s.t0 = t0;
        s.setpoints = vec![WinchSetpoint::Speed(v_reel_out); 3];
    }

    /// Stored for reporting; the three-line kite is steered through the
    /// steering line winches.
    fn set_steering(&mut self, steering: f64) {
        self.session.steering = steering;
    }
}
