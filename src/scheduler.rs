use crate::particle::Particle;
use crate::surface::Surface;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Stops once the collection empties.
    UntilEmpty,
    /// Runs forever and wraps particles at the viewport edges.
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Frame drawn, another one is wanted.
    Continue,
    /// Frame drawn and the collection is now empty.
    Finished,
    /// Nothing to do; the loop is not armed.
    Idle,
}

/// One effect's animation loop: owns the particle collection and the surface
/// it paints on.
pub struct FrameScheduler<P> {
    particles: Vec<P>,
    surface: Surface,
    mode: LoopMode,
    armed: bool,
    frames: u64,
}

impl<P: Particle> FrameScheduler<P> {
    pub fn new(surface: Surface, mode: LoopMode) -> Self {
        Self {
            particles: Vec::new(),
            surface,
            mode,
            armed: mode == LoopMode::Ambient,
            frames: 0,
        }
    }

    /// Appends particles and arms the loop if it was idle. A running loop is
    /// never started twice.
    pub fn spawn<I: IntoIterator<Item = P>>(&mut self, batch: I) {
        self.particles.extend(batch);
        if !self.particles.is_empty() {
            self.armed = true;
        }
    }

    pub fn frame(&mut self) -> FrameStatus {
        if !self.armed {
            return FrameStatus::Idle;
        }

        self.surface.clear();
        match self.mode {
            LoopMode::UntilEmpty => self.particles.retain_mut(|p| p.update()),
            LoopMode::Ambient => {
                let (width, height) = (self.surface.width(), self.surface.height());
                for p in &mut self.particles {
                    p.update();
                    p.wrap(width, height);
                }
            }
        }
        for p in &self.particles {
            p.draw(&mut self.surface);
        }
        self.frames += 1;

        if self.mode == LoopMode::UntilEmpty && self.particles.is_empty() {
            self.armed = false;
            FrameStatus::Finished
        } else {
            FrameStatus::Continue
        }
    }

    /// New logical dimensions; particle positions are kept as they are.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.surface.resize(cols, rows);
    }

    pub fn is_running(&self) -> bool {
        self.armed
    }

    pub fn particles(&self) -> &[P] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Items released on the first poll at or after their due time.
#[derive(Debug, Clone)]
pub struct DelayQueue<T> {
    pending: Vec<(Duration, T)>,
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

impl<T> DelayQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, item: T) {
        // keep sorted; equal due times stay in insertion order
        let at = self.pending.partition_point(|(d, _)| *d <= due);
        self.pending.insert(at, (due, item));
    }

    pub fn drain_due(&mut self, now: Duration) -> Vec<T> {
        let ready = self.pending.partition_point(|(d, _)| *d <= now);
        self.pending.drain(..ready).map(|(_, item)| item).collect()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.first().map(|(d, _)| *d)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Body;

    struct Dot {
        body: Body,
    }

    impl Particle for Dot {
        fn update(&mut self) -> bool {
            self.body.integrate(0.0, 1.0);
            self.body.age()
        }

        fn draw(&self, surface: &mut Surface) {
            surface.fill_circle(self.body.x, self.body.y, 2.0, (255, 255, 255));
        }

        fn wrap(&mut self, width: f32, _height: f32) {
            if self.body.x > width {
                self.body.x = 0.0;
            }
        }
    }

    fn dot(life: u32) -> Dot {
        Dot { body: Body::new(8.0, 8.0, 1.0, 0.0, life) }
    }

    fn scheduler(mode: LoopMode) -> FrameScheduler<Dot> {
        FrameScheduler::new(Surface::resolve(10, 5, 8.0).unwrap(), mode)
    }

    #[test]
    fn idle_until_something_spawns() {
        let mut s = scheduler(LoopMode::UntilEmpty);
        assert_eq!(s.frame(), FrameStatus::Idle);
        s.spawn(Vec::new());
        assert!(!s.is_running());
        s.spawn([dot(3)]);
        assert!(s.is_running());
    }

    #[test]
    fn removes_particle_on_the_frame_life_hits_zero() {
        let mut s = scheduler(LoopMode::UntilEmpty);
        s.spawn([dot(2), dot(3)]);

        assert_eq!(s.frame(), FrameStatus::Continue);
        assert_eq!(s.len(), 2);
        assert_eq!(s.frame(), FrameStatus::Continue);
        assert_eq!(s.len(), 1);
        assert_eq!(s.frame(), FrameStatus::Finished);
        assert!(s.is_empty());
        assert_eq!(s.surface().painted_pixels(), 0);
        assert_eq!(s.frame(), FrameStatus::Idle);
        assert_eq!(s.frames(), 3);
    }

    #[test]
    fn spawning_into_a_running_loop_keeps_one_loop() {
        let mut s = scheduler(LoopMode::UntilEmpty);
        s.spawn([dot(5)]);
        s.frame();
        s.spawn([dot(5)]);
        s.frame();
        assert_eq!(s.frames(), 2);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn ambient_never_finishes_and_wraps() {
        let mut s = scheduler(LoopMode::Ambient);
        assert!(s.is_running());
        s.spawn([Dot { body: Body::new(79.5, 8.0, 1.0, 0.0, 1) }]);
        for _ in 0..5 {
            assert_eq!(s.frame(), FrameStatus::Continue);
        }
        assert_eq!(s.len(), 1);
        assert!(s.particles()[0].body.x < 80.0);
    }

    #[test]
    fn resize_keeps_particles() {
        let mut s = scheduler(LoopMode::Ambient);
        s.spawn((0..7).map(|_| dot(100)));
        s.frame();
        s.resize(3, 2);
        s.frame();
        s.resize(0, 0);
        s.frame();
        assert_eq!(s.len(), 7);
    }

    #[test]
    fn delay_queue_releases_in_due_order() {
        let mut q = DelayQueue::new();
        q.schedule(Duration::from_millis(600), "c");
        q.schedule(Duration::from_millis(0), "a");
        q.schedule(Duration::from_millis(300), "b");
        q.schedule(Duration::from_millis(300), "b2");

        assert_eq!(q.next_due(), Some(Duration::ZERO));
        assert_eq!(q.drain_due(Duration::from_millis(299)), vec!["a"]);
        assert!(q.drain_due(Duration::from_millis(299)).is_empty());
        assert_eq!(q.drain_due(Duration::from_millis(300)), vec!["b", "b2"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain_due(Duration::from_secs(5)), vec!["c"]);
        assert!(q.is_empty());
    }
}
