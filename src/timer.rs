pub struct FrameTimer {
    last_time: f64,
    delta_time: f32,
}

impl FrameTimer {
    pub fn new(now: f64) -> Self {
        Self {
            last_time: now,
            delta_time: 0.0,
        }
    }

    pub fn update(&mut self, now: f64) {
        self.delta_time = (now - self.last_time) as f32;
        self.last_time = now;
    }

    pub fn delta(&self) -> f32 {
        self.delta_time
    }

    pub fn fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }

    pub fn ms_per_frame(&self) -> f32 {
        self.delta_time * 1000.0
    }

    pub fn title(&self, base: &str) -> String {
        format!("{base} {:.2}ms {:.0}fps", self.ms_per_frame(), self.fps())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_tracks_successive_updates() {
        let mut timer = FrameTimer::new(1.0);
        timer.update(1.5);
        assert_eq!(timer.delta(), 0.5);
        assert_eq!(timer.fps(), 2.0);
        assert_eq!(timer.ms_per_frame(), 500.0);

        timer.update(1.75);
        assert_eq!(timer.delta(), 0.25);
    }

    #[test]
    fn zero_delta_reports_zero_fps() {
        let timer = FrameTimer::new(3.0);
        assert_eq!(timer.fps(), 0.0);
    }

    #[test]
    fn title_contains_stats() {
        let mut timer = FrameTimer::new(0.0);
        timer.update(0.02);
        assert_eq!(timer.title("glint"), "glint 20.00ms 50fps");
    }
}
