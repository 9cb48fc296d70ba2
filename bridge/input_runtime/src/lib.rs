pub mod assets;
pub mod config;
pub mod dispatcher;
pub mod element;
pub mod error;
pub mod field;
pub mod geometry;
pub mod mobile_input;
pub mod overlay;
pub mod peer;
pub mod protocol;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod testing;

use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::dispatcher::{Plugin, PluginDispatcher, PluginHost, PluginKind};
use crate::peer::MessagingPeer;

pub use crate::config::{BridgeSettings, FieldConfig, FieldOptions, Rgba};
pub use crate::element::{ElementStyle, ManagedElement};
pub use crate::error::{BridgeError, Result};
pub use crate::field::{FieldPhase, Frame, KeyPress, NativeInputField};
pub use crate::geometry::{Rect, Size, Vec2};
pub use crate::mobile_input::{KeyboardState, MobileInput};
pub use crate::peer::{EditorPeer, NativePeer, Platform};
pub use crate::registry::FieldId;
pub use serde_json;

const WRITER_DRAIN_GRACE: Duration = Duration::from_millis(500);

struct Plugins {
    mobile_input: MobileInput,
}

impl PluginHost for Plugins {
    fn plugin_mut(&mut self, kind: PluginKind) -> Option<&mut dyn Plugin> {
        match kind {
            PluginKind::MobileInput if self.mobile_input.is_active() => {
                Some(&mut self.mobile_input as &mut dyn Plugin)
            }
            PluginKind::MobileInput => None,
        }
    }
}

/// The managed side of the native text input bridge.
pub struct Bridge {
    dispatcher: PluginDispatcher,
    plugins: Plugins,
    init_error: Option<BridgeError>,
}

impl Bridge {
    /// Prepares font assets and starts the mobile-input plugin. If the assets
    /// cannot be prepared the bridge still comes up, but inactive: every
    /// attach returns [`FieldId::INVALID`].
    pub fn new(settings: &BridgeSettings, peer: Box<dyn NativePeer>) -> Self {
        let (mobile_input, init_error) = match assets::prepare_fonts(settings) {
            Ok(_) => (MobileInput::new(settings, peer), None),
            Err(err) => {
                error!("mobile input disabled: {err}");
                (MobileInput::inactive(settings, peer), Some(err))
            }
        };

        Self {
            dispatcher: PluginDispatcher::with_defaults(),
            plugins: Plugins { mobile_input },
            init_error,
        }
    }

    pub fn is_active(&self) -> bool {
        self.plugins.mobile_input.is_active()
    }

    pub fn init_error(&self) -> Option<&BridgeError> {
        self.init_error.as_ref()
    }

    /// Entry point for one raw plugin envelope from the native layer.
    pub fn dispatch(&mut self, raw: &str) {
        self.dispatcher.dispatch(raw, &mut self.plugins);
    }

    pub fn mobile_input(&self) -> &MobileInput {
        &self.plugins.mobile_input
    }

    pub fn mobile_input_mut(&mut self) -> &mut MobileInput {
        &mut self.plugins.mobile_input
    }

    pub fn tick(&mut self, frame: &Frame) {
        self.plugins.mobile_input.tick(frame);
    }

    pub fn shutdown(&mut self) {
        self.plugins.mobile_input.shutdown();
    }
}

/// The UI toolkit integration driven by [`run`].
pub trait ManagedHost {
    /// Waits for the next update cycle. `None` ends the loop.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Runs after inbound messages for this frame are dispatched and before
    /// the bridge ticks. Fields are attached, laid out and driven from here.
    fn update(&mut self, bridge: &mut Bridge, frame: &Frame);
}

/// Runs the bridge against the native layer on stdin/stdout, configured from
/// the environment.
pub fn run<H: ManagedHost>(host: &mut H, platform: Platform) -> Result<()> {
    run_with_io(
        host,
        &BridgeSettings::from_env(),
        platform,
        io::stdin(),
        io::stdout(),
    )
}

pub fn run_with_io<H, R, W>(
    host: &mut H,
    settings: &BridgeSettings,
    platform: Platform,
    reader: R,
    writer: W,
) -> Result<()>
where
    H: ManagedHost,
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let (peer, outbound_rx) = MessagingPeer::channel(platform, settings.outbound_queue_cap);
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>();

    let writer_handle = thread::spawn(move || transport::writer_loop(outbound_rx, writer));

    let reader_handle = thread::spawn(move || {
        let read_result = transport::reader_loop(reader, |raw| {
            if inbound_tx.send(raw).is_err() {
                warn!("bridge loop gone; dropping inbound message");
            }
        });

        if let Err(err) = &read_result {
            error!("reader loop terminated with error: {err}");
        }

        read_result
    });

    let mut bridge = Bridge::new(settings, Box::new(peer));
    info!("native input bridge started on {platform:?}");

    while let Some(frame) = host.next_frame() {
        for raw in inbound_rx.try_iter() {
            bridge.dispatch(&raw);
        }
        host.update(&mut bridge, &frame);
        bridge.tick(&frame);
    }

    bridge.shutdown();
    // Dropping the bridge drops the peer, which closes the outbound queue.
    drop(bridge);

    wait_for(&writer_handle, WRITER_DRAIN_GRACE);
    join_if_finished("reader", reader_handle);
    join_if_finished("writer", writer_handle);

    Ok(())
}

fn wait_for<T>(handle: &JoinHandle<T>, grace: Duration) {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
}

fn join_if_finished(name: &str, handle: JoinHandle<Result<()>>) {
    if handle.is_finished() {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!("{name} thread returned error: {err}"),
            Err(err) => error!("{name} thread join failed: {err:?}"),
        }
    } else {
        // Avoid hanging process exit on blocked stdio during teardown.
        warn!("{name} thread still active during shutdown; skipping join");
    }
}
