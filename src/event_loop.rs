use std::io;
use std::time::{Duration, Instant};

use crossterm::event::Event;

use crate::drivers::InputDriver;

pub enum ControlFlow {
    Continue,
    Quit,
}

/// What the loop hands to its handler.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    Input(Event),
    /// Wall time passed since the previous tick; drives animations and
    /// hover delays.
    Tick(Duration),
}

/// Single-threaded message pump for the desktop front-end.
///
/// Every iteration first reports a tick with the elapsed wall time, then
/// waits up to `poll_interval` for input and drains whatever arrived, so a
/// burst of pointer motion is handled before the next frame is drawn.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, LoopEvent) -> io::Result<ControlFlow>,
    {
        let mut last_tick = Instant::now();
        loop {
            let now = Instant::now();
            let elapsed = now.duration_since(last_tick);
            last_tick = now;
            if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Tick(elapsed))? {
                return Ok(());
            }

            if !self.driver.poll(self.poll_interval)? {
                continue;
            }
            loop {
                let event = self.driver.read()?;
                if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Input(event))? {
                    return Ok(());
                }
                if !self.driver.poll(Duration::ZERO)? {
                    break;
                }
            }
        }
    }
}
