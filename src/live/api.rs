use crate::client::Client;
use crate::error::Result;
use crate::message::Arg;

/// Entry point to the Live API namespaces
#[derive(Clone)]
pub struct Live {
    client: Client,
}

impl Live {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn application(&self) -> ApplicationApi<'_> {
        ApplicationApi {
            client: &self.client,
        }
    }

    pub fn song(&self) -> SongApi<'_> {
        SongApi {
            client: &self.client,
        }
    }

    pub fn track(&self) -> TrackApi<'_> {
        TrackApi {
            client: &self.client,
        }
    }
}

pub struct ApplicationApi<'a> {
    client: &'a Client,
}

impl ApplicationApi<'_> {
    /// Round trip that Live answers with "ok"
    pub async fn test(&self) -> Result<String> {
        self.client.invoke("/live/test", vec![], 0).await
    }

    /// (major, minor)
    pub async fn version(&self) -> Result<(i32, i32)> {
        self.client
            .invoke("/live/application/get/version", vec![], 0)
            .await
    }

    pub async fn log_level(&self) -> Result<String> {
        self.client.invoke("/live/api/get/log_level", vec![], 0).await
    }

    /// Reload the remote script
    pub async fn reload(&self) -> Result<()> {
        self.client.notify("/live/api/reload", vec![]).await
    }
}

pub struct SongApi<'a> {
    client: &'a Client,
}

impl SongApi<'_> {
    pub async fn tempo(&self) -> Result<f32> {
        self.client.invoke("/live/song/get/tempo", vec![], 0).await
    }

    pub async fn set_tempo(&self, bpm: f32) -> Result<()> {
        self.client
            .notify("/live/song/set/tempo", vec![Arg::from(bpm)])
            .await
    }

    pub async fn is_playing(&self) -> Result<bool> {
        self.client.invoke("/live/song/get/is_playing", vec![], 0).await
    }

    pub async fn num_tracks(&self) -> Result<i32> {
        self.client.invoke("/live/song/get/num_tracks", vec![], 0).await
    }

    pub async fn start_playing(&self) -> Result<()> {
        self.client.notify("/live/song/start_playing", vec![]).await
    }

    pub async fn stop_playing(&self) -> Result<()> {
        self.client.notify("/live/song/stop_playing", vec![]).await
    }

    pub async fn continue_playing(&self) -> Result<()> {
        self.client.notify("/live/song/continue_playing", vec![]).await
    }

    pub async fn create_midi_track(&self, index: i32) -> Result<()> {
        self.client
            .notify("/live/song/create_midi_track", vec![Arg::from(index)])
            .await
    }
}

pub struct TrackApi<'a> {
    client: &'a Client,
}

// Track replies echo the track id first
impl TrackApi<'_> {
    pub async fn name(&self, track_id: i32) -> Result<String> {
        self.client
            .invoke("/live/track/get/name", vec![Arg::from(track_id)], 1)
            .await
    }

    pub async fn set_name(&self, track_id: i32, name: &str) -> Result<()> {
        self.client
            .notify(
                "/live/track/set/name",
                vec![Arg::from(track_id), Arg::from(name)],
            )
            .await
    }

    pub async fn volume(&self, track_id: i32) -> Result<f32> {
        self.client
            .invoke("/live/track/get/volume", vec![Arg::from(track_id)], 1)
            .await
    }

    pub async fn set_volume(&self, track_id: i32, volume: f32) -> Result<()> {
        self.client
            .notify(
                "/live/track/set/volume",
                vec![Arg::from(track_id), Arg::from(volume)],
            )
            .await
    }

    pub async fn arm(&self, track_id: i32) -> Result<bool> {
        self.client
            .invoke("/live/track/get/arm", vec![Arg::from(track_id)], 1)
            .await
    }

    pub async fn available_input_routing_types(&self, track_id: i32) -> Result<Vec<String>> {
        self.client
            .invoke(
                "/live/track/get/available_input_routing_types",
                vec![Arg::from(track_id)],
                1,
            )
            .await
    }

    pub async fn stop_all_clips(&self, track_id: i32) -> Result<()> {
        self.client
            .notify("/live/track/stop_all_clips", vec![Arg::from(track_id)])
            .await
    }
}
