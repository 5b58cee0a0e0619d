//! Bridge runtime: one tick loop over all camera and landmark state
//!
//! Each tick drains the mailbox (non-blocking), feeds the aggregator and
//! the camera rig, then publishes a feedback snapshot for the connection
//! handlers. The tick loop never touches a socket; broadcasts go through
//! the registry's queued best-effort sends.

use std::sync::Arc;
use std::time::Duration;

use kinelink_control::{
    AggregatorConfig, CameraConfig, CameraDirective, CameraRig, LandmarkAggregator, TrackedTarget,
};
use kinelink_core::{KinelinkResult, TickClock};
use kinelink_net::{
    BridgeServer, ClientRegistry, FeedbackCell, FeedbackSnapshot, Mailbox, ServerConfig,
    StateSnapshot,
};
use kinelink_wire::FeedbackMessage;

/// Top-level bridge configuration
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Tick cadence; ~30 Hz by default
    pub tick_interval: Duration,
    /// Broadcast the camera/target feedback line to every client each
    /// tick, in addition to the per-message replies
    pub broadcast_feedback: bool,
    /// Noise values the mailbox starts with, so early messages that omit
    /// the noise keys fall back to these instead of zero
    pub initial_noise_intensity: f32,
    pub initial_noise_speed: f32,
    pub server: ServerConfig,
    pub camera: CameraConfig,
    pub aggregator: AggregatorConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tick_interval: Duration::from_millis(33),
            broadcast_feedback: false,
            initial_noise_intensity: 0.0,
            initial_noise_speed: 0.0,
            server: ServerConfig::default(),
            camera: CameraConfig::default(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

/// The assembled bridge: server, tick-side state and the shared cells
pub struct BridgeRuntime {
    config: RuntimeConfig,
    server: BridgeServer,
    mailbox: Arc<Mailbox>,
    feedback: Arc<FeedbackCell>,
    registry: Arc<ClientRegistry>,
    camera: CameraRig,
    aggregator: LandmarkAggregator,
    clock: TickClock,
    state: StateSnapshot,
}

impl BridgeRuntime {
    /// Bind the server and assemble the tick-side state
    ///
    /// The mailbox is seeded with the configured noise values and the
    /// rig's resting position as the vector-move destination, so a first
    /// message that omits those keys does not zero them.
    pub async fn start(config: RuntimeConfig) -> KinelinkResult<Self> {
        let camera = CameraRig::new(config.camera.clone());
        let seed = StateSnapshot {
            noise_intensity: config.initial_noise_intensity,
            noise_speed: config.initial_noise_speed,
            camera_target: camera.position,
            ..StateSnapshot::default()
        };
        let mailbox = Arc::new(Mailbox::with_initial(seed.clone()));
        let feedback = Arc::new(FeedbackCell::new());
        let registry = Arc::new(ClientRegistry::new());

        let server = BridgeServer::bind(
            config.server.clone(),
            Arc::clone(&mailbox),
            Arc::clone(&feedback),
            Arc::clone(&registry),
        )
        .await?;

        Ok(BridgeRuntime {
            camera,
            aggregator: LandmarkAggregator::new(config.aggregator.clone()),
            clock: TickClock::new(),
            state: seed,
            config,
            server,
            mailbox,
            feedback,
            registry,
        })
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.server.local_addr()
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn aggregator(&self) -> &LandmarkAggregator {
        &self.aggregator
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Last state consumed from the mailbox; scalar passthrough fields
    /// (`param`, noise values, `features`) are read from here
    pub fn state(&self) -> &StateSnapshot {
        &self.state
    }

    /// One pass of the render cadence
    pub fn tick(&mut self) {
        let dt = self.clock.tick().as_secs_f32();

        let snapshot = self.mailbox.take_if_dirty();
        if let Some(snapshot) = &snapshot {
            self.state = snapshot.clone();
            if let Some(landmarks) = &snapshot.landmarks {
                self.aggregator.ingest(landmarks);
            }
        }

        self.aggregator.tick(dt);
        let target = TrackedTarget {
            position: self.aggregator.center(),
            forward: self.aggregator.body_forward(),
        };

        if let Some(snapshot) = &snapshot {
            let directive = CameraDirective {
                mode: snapshot.camera_mode,
                destination: snapshot.camera_target,
                speed_factor: snapshot.move_speed_factor,
                key_speeds: snapshot.key_speeds,
            };
            self.camera.ingest(&directive, Some(&target), dt);
        }

        self.camera.update(Some(&target), dt);

        let feedback = FeedbackSnapshot {
            frame_num: self.state.frame_num,
            camera_position: self.camera.position,
            target_position: target.position,
            camera_mode: self.camera.mode_code(),
        };
        self.feedback.publish(feedback);

        if self.config.broadcast_feedback {
            self.broadcast(&feedback);
        }
    }

    fn broadcast(&self, feedback: &FeedbackSnapshot) {
        let line = FeedbackMessage::new(
            feedback.frame_num,
            feedback.camera_position,
            feedback.target_position,
            feedback.camera_mode,
            "",
        )
        .encode_line();
        match line {
            Ok(line) => {
                self.registry.broadcast(&line);
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode broadcast line"),
        }
    }

    /// Run the tick loop until the future is dropped
    pub async fn run(&mut self) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.tick();
        }
    }

    /// Stop accepting and drop every client connection
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use kinelink_core::Vec3;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;
    use tokio::time::{sleep, timeout};

    fn test_config() -> RuntimeConfig {
        RuntimeConfig {
            server: ServerConfig {
                port: 0,
                ..ServerConfig::default()
            },
            ..RuntimeConfig::default()
        }
    }

    /// Tick until the camera settles on `destination`, checking that the
    /// remaining distance never grows
    async fn tick_to_destination(runtime: &mut BridgeRuntime, destination: Vec3) {
        let mut last = runtime.camera().position.distance(destination);
        for _ in 0..400 {
            sleep(Duration::from_millis(5)).await;
            runtime.tick();
            let dist = runtime.camera().position.distance(destination);
            assert!(dist <= last + 1e-3, "camera moved away from destination");
            last = dist;
            if runtime.camera().position == destination {
                return;
            }
        }
        panic!("camera never reached {destination:?}, still {last} away");
    }

    #[tokio::test]
    async fn test_vector_move_end_to_end() {
        let mut runtime = BridgeRuntime::start(test_config()).await.unwrap();
        let mut stream = TcpStream::connect(runtime.local_addr()).await.unwrap();

        stream
            .write_all(
                b"{\"cameraMode\":2,\"cameratransform\":[5.0,0.0,0.0],\"cameraMoveSpeedFactor\":1.0}\n",
            )
            .await
            .unwrap();

        tick_to_destination(&mut runtime, Vec3::new(5.0, 0.0, 0.0)).await;

        // Halted: further ticks do not move it
        for _ in 0..5 {
            sleep(Duration::from_millis(5)).await;
            runtime.tick();
        }
        assert_eq!(runtime.camera().position, Vec3::new(5.0, 0.0, 0.0));

        runtime.shutdown();
    }

    #[tokio::test]
    async fn test_mode_without_destination_retains_previous() {
        let mut runtime = BridgeRuntime::start(test_config()).await.unwrap();
        let mut stream = TcpStream::connect(runtime.local_addr()).await.unwrap();

        stream
            .write_all(
                b"{\"cameraMode\":2,\"cameratransform\":[2.0,0.0,0.0],\"cameraMoveSpeedFactor\":1.0}\n",
            )
            .await
            .unwrap();
        tick_to_destination(&mut runtime, Vec3::new(2.0, 0.0, 0.0)).await;

        // A new vector-move directive with no destination reuses the
        // cached one; the camera stays put at (2, 0, 0)
        stream
            .write_all(b"{\"cameraMode\":2,\"cameraMoveSpeedFactor\":1.0}\n")
            .await
            .unwrap();
        for _ in 0..50 {
            sleep(Duration::from_millis(5)).await;
            runtime.tick();
            assert_eq!(runtime.camera().position, Vec3::new(2.0, 0.0, 0.0));
        }

        runtime.shutdown();
    }

    #[tokio::test]
    async fn test_broadcast_without_inbound_traffic() {
        let mut config = test_config();
        config.broadcast_feedback = true;
        let mut runtime = BridgeRuntime::start(config).await.unwrap();

        let stream = TcpStream::connect(runtime.local_addr()).await.unwrap();
        let mut reader = BufReader::new(stream);

        // The client sends nothing; broadcast lines arrive anyway
        let mut line = String::new();
        timeout(Duration::from_secs(5), async {
            loop {
                runtime.tick();
                // Bounded read so the tick keeps running while the
                // client is still being registered
                match timeout(Duration::from_millis(50), reader.read_line(&mut line)).await {
                    Ok(Ok(n)) if n > 0 => break,
                    _ => {}
                }
            }
        })
        .await
        .unwrap();
        assert!(line.contains("\"cameraToTargetRelativePosition\""));

        runtime.shutdown();
    }

    #[tokio::test]
    async fn test_initial_seed_survives_partial_first_message() {
        let mut config = test_config();
        config.initial_noise_intensity = 0.5;
        config.initial_noise_speed = 0.00001;
        let mut runtime = BridgeRuntime::start(config).await.unwrap();
        let resting = runtime.camera().position;

        let mut stream = TcpStream::connect(runtime.local_addr()).await.unwrap();

        // First message carries neither noise keys nor a destination;
        // the configured seed fills the gaps
        stream
            .write_all(b"{\"frameNum\":1,\"cameraMode\":2,\"cameraMoveSpeedFactor\":1.0}\n")
            .await
            .unwrap();

        timeout(Duration::from_secs(2), async {
            while runtime.state().frame_num != 1 {
                sleep(Duration::from_millis(5)).await;
                runtime.tick();
            }
        })
        .await
        .unwrap();

        assert_eq!(runtime.state().noise_intensity, 0.5);
        assert_eq!(runtime.state().noise_speed, 0.00001);

        // The seeded destination is the rig's resting position, so the
        // destination-less vector move holds still
        for _ in 0..20 {
            sleep(Duration::from_millis(5)).await;
            runtime.tick();
            assert_eq!(runtime.camera().position, resting);
        }

        runtime.shutdown();
    }

    #[tokio::test]
    async fn test_landmarks_feed_aggregator() {
        let mut runtime = BridgeRuntime::start(test_config()).await.unwrap();
        let mut stream = TcpStream::connect(runtime.local_addr()).await.unwrap();

        let landmarks: Vec<[f32; 3]> = (0..23).map(|_| [0.1, 0.2, 0.3]).collect();
        let json = format!(
            "{{\"frameNum\":1,\"landmarks\":{}}}\n",
            serde_json::to_string(&landmarks).unwrap()
        );
        stream.write_all(json.as_bytes()).await.unwrap();

        timeout(Duration::from_secs(2), async {
            while !runtime.aggregator().is_calibrated() {
                sleep(Duration::from_millis(5)).await;
                runtime.tick();
            }
        })
        .await
        .unwrap();
    }
}
