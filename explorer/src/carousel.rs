//! Homepage carousel: a bounded thumbnail grid plus a main image that rotates
//! through the whole capture set until the user picks a thumbnail.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::store::Catalog;
use crate::widgets::CarouselView;

pub const AUTOPLAY_PERIOD: Duration = Duration::from_millis(2000);
pub const SAMPLE_SIZE: usize = 120;

const THUMBNAIL_SIZE: u32 = 40;
const THUMBNAIL_GAP: u32 = 1;
const MIN_COLUMNS: u32 = 8;
const MAX_COLUMNS: u32 = 15;
const DEFAULT_GRID_WIDTH: u32 = 600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Playback {
    Idle,
    Autoplaying,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CarouselEvent {
    Tick,
    ThumbnailSelected(String),
    VisibilityChanged(Visibility),
    Resized { width: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CarouselEffect {
    Layout { columns: u32 },
    ShowMainImage(String),
    StartTimer,
    CancelTimer,
}

/// Grid columns for a container `width` pixels wide.
pub fn grid_columns(width: u32) -> u32 {
    let width = if width == 0 { DEFAULT_GRID_WIDTH } else { width };
    (width / (THUMBNAIL_SIZE + THUMBNAIL_GAP)).clamp(MIN_COLUMNS, MAX_COLUMNS)
}

#[derive(Debug)]
pub struct GridCarousel {
    /// Every capture id, shuffled once at init. The grid shows a prefix.
    ids: Vec<String>,
    displayed: usize,
    current: Option<usize>,
    playback: Playback,
    columns: u32,
}

impl GridCarousel {
    pub fn init<R: Rng + ?Sized>(
        catalog: &Catalog,
        sample_size: usize,
        width: u32,
        rng: &mut R,
    ) -> (Self, Vec<CarouselEffect>) {
        let mut ids = catalog.all_capture_ids();
        ids.shuffle(rng);

        let columns = grid_columns(width);
        let mut carousel = GridCarousel {
            displayed: sample_size.min(ids.len()),
            current: None,
            playback: Playback::Idle,
            columns,
            ids,
        };
        let mut effects = vec![CarouselEffect::Layout { columns }];

        if carousel.ids.is_empty() {
            log::warn!("No captures to show, autoplay stays off");
            return (carousel, effects);
        }

        // Drawn from the full set, not only the displayed sample.
        let first = rng.random_range(0..carousel.ids.len());
        effects.push(carousel.show(first));
        effects.extend(carousel.start());
        (carousel, effects)
    }

    pub fn dispatch<R: Rng + ?Sized>(
        &mut self,
        event: CarouselEvent,
        rng: &mut R,
    ) -> Vec<CarouselEffect> {
        match event {
            CarouselEvent::Tick => match self.playback {
                Playback::Autoplaying => vec![self.advance(rng)],
                Playback::Idle => {
                    log::debug!("Ignoring tick while idle");
                    vec![]
                }
            },
            CarouselEvent::ThumbnailSelected(id) => {
                let Some(index) = self.ids.iter().position(|known| *known == id) else {
                    log::warn!("No capture {} in the carousel", id);
                    return vec![];
                };
                let mut effects = self.stop();
                effects.push(self.show(index));
                effects
            }
            CarouselEvent::VisibilityChanged(Visibility::Visible) => self.start(),
            CarouselEvent::VisibilityChanged(Visibility::Hidden) => self.stop(),
            CarouselEvent::Resized { width } => {
                self.columns = grid_columns(width);
                vec![CarouselEffect::Layout {
                    columns: self.columns,
                }]
            }
        }
    }

    /// Restarts even when already playing, so the driver replaces its timer.
    fn start(&mut self) -> Vec<CarouselEffect> {
        if self.ids.is_empty() {
            return vec![];
        }
        self.playback = Playback::Autoplaying;
        log::info!("Autoplay started");
        vec![CarouselEffect::StartTimer]
    }

    fn stop(&mut self) -> Vec<CarouselEffect> {
        match self.playback {
            Playback::Autoplaying => {
                self.playback = Playback::Idle;
                log::info!("Autoplay stopped");
                vec![CarouselEffect::CancelTimer]
            }
            Playback::Idle => vec![],
        }
    }

    /// Uniform pick over the full set, excluding the image already shown.
    fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> CarouselEffect {
        let next = match (self.current, self.ids.len()) {
            (Some(current), len) if len > 1 => {
                let pick = rng.random_range(0..len - 1);
                if pick >= current {
                    pick + 1
                } else {
                    pick
                }
            }
            (_, len) => rng.random_range(0..len),
        };
        self.show(next)
    }

    fn show(&mut self, index: usize) -> CarouselEffect {
        self.current = Some(index);
        let id = self.ids[index].clone();
        log::debug!("Updating main image to: {}", id);
        CarouselEffect::ShowMainImage(id)
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn main_image(&self) -> Option<&str> {
        self.current.map(|index| self.ids[index].as_str())
    }

    /// Ids shown in the thumbnail grid, in display order.
    pub fn displayed_ids(&self) -> &[String] {
        &self.ids[..self.displayed]
    }

    pub fn all_ids(&self) -> &[String] {
        &self.ids
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }
}

/// Drive a carousel from UI events and its own timer until `events` closes.
///
/// At most one interval exists at a time: starting replaces the previous one
/// and cancelling drops it.
pub async fn run<V, R>(
    mut carousel: GridCarousel,
    initial: Vec<CarouselEffect>,
    mut events: mpsc::UnboundedReceiver<CarouselEvent>,
    view: &mut V,
    rng: &mut R,
    period: Duration,
) -> GridCarousel
where
    V: CarouselView,
    R: Rng + ?Sized,
{
    let mut timer: Option<Interval> = None;
    apply(&carousel, initial, view, &mut timer, period);

    loop {
        let event = tokio::select! {
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = next_tick(&mut timer) => CarouselEvent::Tick,
        };
        let effects = carousel.dispatch(event, rng);
        apply(&carousel, effects, view, &mut timer, period);
    }

    carousel
}

fn apply<V: CarouselView>(
    carousel: &GridCarousel,
    effects: Vec<CarouselEffect>,
    view: &mut V,
    timer: &mut Option<Interval>,
    period: Duration,
) {
    for effect in effects {
        match effect {
            CarouselEffect::Layout { columns } => view.layout_grid(columns, carousel.displayed_ids()),
            CarouselEffect::ShowMainImage(id) => view.show_main_image(&id),
            CarouselEffect::StartTimer => {
                // setInterval semantics: first tick one full period from now.
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *timer = Some(interval);
            }
            CarouselEffect::CancelTimer => *timer = None,
        }
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::models::{parse_metadata, LocationsDocument};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    fn catalog_of(size: usize) -> Catalog {
        let metadata: serde_json::Map<String, serde_json::Value> = (0..size)
            .map(|i| (format!("{}", i + 1), serde_json::json!({})))
            .collect();
        let bytes = serde_json::to_vec(&metadata).unwrap();
        Catalog::new(parse_metadata(&bytes).unwrap(), LocationsDocument::default())
    }

    #[test]
    fn test_grid_columns() {
        assert_eq!(grid_columns(0), 14);
        assert_eq!(grid_columns(100), 8);
        assert_eq!(grid_columns(410), 10);
        assert_eq!(grid_columns(2000), 15);
    }

    #[test]
    fn test_init_samples_grid_and_autoplays_from_full_set() {
        let catalog = catalog_of(500);
        let all: HashSet<String> = catalog.all_capture_ids().into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let (carousel, effects) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);

        assert_eq!(carousel.displayed_ids().len(), 120);
        let displayed: HashSet<&String> = carousel.displayed_ids().iter().collect();
        assert_eq!(displayed.len(), 120);
        assert!(displayed.iter().all(|id| all.contains(*id)));
        assert_eq!(carousel.all_ids().len(), 500);

        let main = carousel.main_image().unwrap().to_string();
        assert!(all.contains(&main));
        assert_eq!(carousel.playback(), Playback::Autoplaying);
        assert_eq!(
            effects,
            vec![
                CarouselEffect::Layout { columns: 14 },
                CarouselEffect::ShowMainImage(main),
                CarouselEffect::StartTimer,
            ]
        );
    }

    #[test]
    fn test_autoplay_reaches_beyond_displayed_sample() {
        let catalog = catalog_of(500);
        let mut rng = StdRng::seed_from_u64(11);
        let (mut carousel, _) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);
        let displayed: HashSet<String> = carousel.displayed_ids().iter().cloned().collect();

        let mut outside_sample = false;
        for _ in 0..200 {
            carousel.dispatch(CarouselEvent::Tick, &mut rng);
            let main = carousel.main_image().unwrap();
            outside_sample |= !displayed.contains(main);
        }
        assert!(outside_sample);
    }

    #[test]
    fn test_tick_changes_main_image() {
        let catalog = catalog_of(500);
        let all: HashSet<String> = catalog.all_capture_ids().into_iter().collect();
        let mut rng = StdRng::seed_from_u64(3);
        let (mut carousel, _) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);

        for _ in 0..50 {
            let before = carousel.main_image().unwrap().to_string();
            let effects = carousel.dispatch(CarouselEvent::Tick, &mut rng);
            let after = carousel.main_image().unwrap().to_string();

            assert_ne!(before, after);
            assert!(all.contains(&after));
            assert_eq!(effects, vec![CarouselEffect::ShowMainImage(after)]);
        }
    }

    #[test]
    fn test_thumbnail_selection_stops_autoplay_until_visible_again() {
        let catalog = catalog_of(500);
        let mut rng = StdRng::seed_from_u64(5);
        let (mut carousel, _) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);
        let picked = carousel.displayed_ids()[3].clone();

        let effects = carousel.dispatch(CarouselEvent::ThumbnailSelected(picked.clone()), &mut rng);
        assert_eq!(
            effects,
            vec![
                CarouselEffect::CancelTimer,
                CarouselEffect::ShowMainImage(picked.clone()),
            ]
        );
        assert_eq!(carousel.playback(), Playback::Idle);

        for _ in 0..5 {
            assert!(carousel.dispatch(CarouselEvent::Tick, &mut rng).is_empty());
        }
        assert_eq!(carousel.main_image(), Some(picked.as_str()));

        let effects = carousel.dispatch(
            CarouselEvent::VisibilityChanged(Visibility::Visible),
            &mut rng,
        );
        assert_eq!(effects, vec![CarouselEffect::StartTimer]);
        assert_eq!(carousel.playback(), Playback::Autoplaying);
        assert_eq!(carousel.dispatch(CarouselEvent::Tick, &mut rng).len(), 1);
        assert_ne!(carousel.main_image(), Some(picked.as_str()));
    }

    #[test]
    fn test_selecting_while_idle_does_not_cancel_twice() {
        let catalog = catalog_of(10);
        let mut rng = StdRng::seed_from_u64(1);
        let (mut carousel, _) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);

        carousel.dispatch(CarouselEvent::VisibilityChanged(Visibility::Hidden), &mut rng);
        let effects = carousel.dispatch(CarouselEvent::ThumbnailSelected("4".to_string()), &mut rng);
        assert_eq!(effects, vec![CarouselEffect::ShowMainImage("4".to_string())]);
    }

    #[test]
    fn test_unknown_thumbnail_is_ignored() {
        let catalog = catalog_of(10);
        let mut rng = StdRng::seed_from_u64(2);
        let (mut carousel, _) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);
        let main = carousel.main_image().map(str::to_string);

        let effects = carousel.dispatch(CarouselEvent::ThumbnailSelected("nope".to_string()), &mut rng);
        assert!(effects.is_empty());
        assert_eq!(carousel.playback(), Playback::Autoplaying);
        assert_eq!(carousel.main_image().map(str::to_string), main);
    }

    #[test]
    fn test_visibility_transitions() {
        let catalog = catalog_of(10);
        let mut rng = StdRng::seed_from_u64(4);
        let (mut carousel, _) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);

        let hidden = CarouselEvent::VisibilityChanged(Visibility::Hidden);
        let visible = CarouselEvent::VisibilityChanged(Visibility::Visible);

        assert_eq!(carousel.dispatch(hidden.clone(), &mut rng), vec![CarouselEffect::CancelTimer]);
        assert_eq!(carousel.playback(), Playback::Idle);
        assert!(carousel.dispatch(hidden, &mut rng).is_empty());

        assert_eq!(carousel.dispatch(visible.clone(), &mut rng), vec![CarouselEffect::StartTimer]);
        // Regaining visibility while playing restarts the timer.
        assert_eq!(carousel.dispatch(visible, &mut rng), vec![CarouselEffect::StartTimer]);
        assert_eq!(carousel.playback(), Playback::Autoplaying);
    }

    #[test]
    fn test_small_and_empty_catalogs() {
        let mut rng = StdRng::seed_from_u64(9);

        let (mut single, _) = GridCarousel::init(&catalog_of(1), SAMPLE_SIZE, 600, &mut rng);
        assert_eq!(single.displayed_ids().len(), 1);
        single.dispatch(CarouselEvent::Tick, &mut rng);
        assert_eq!(single.main_image(), Some("1"));

        let (mut empty, effects) = GridCarousel::init(&catalog_of(0), SAMPLE_SIZE, 600, &mut rng);
        assert_eq!(effects, vec![CarouselEffect::Layout { columns: 14 }]);
        assert_eq!(empty.playback(), Playback::Idle);
        assert_eq!(empty.main_image(), None);
        assert!(empty
            .dispatch(CarouselEvent::VisibilityChanged(Visibility::Visible), &mut rng)
            .is_empty());
    }

    #[test]
    fn test_resize_recomputes_columns() {
        let mut rng = StdRng::seed_from_u64(6);
        let (mut carousel, _) = GridCarousel::init(&catalog_of(20), SAMPLE_SIZE, 600, &mut rng);
        let effects = carousel.dispatch(CarouselEvent::Resized { width: 1000 }, &mut rng);
        assert_eq!(effects, vec![CarouselEffect::Layout { columns: 15 }]);
        assert_eq!(carousel.columns(), 15);
    }

    #[derive(Clone, Default)]
    struct RecordingView {
        shown: Arc<Mutex<Vec<String>>>,
    }

    impl CarouselView for RecordingView {
        fn show_main_image(&mut self, id: &str) {
            self.shown.lock().unwrap().push(id.to_string());
        }

        fn layout_grid(&mut self, _columns: u32, _thumbnails: &[String]) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_every_period_and_honours_selection() {
        let catalog = catalog_of(500);
        let mut rng = StdRng::seed_from_u64(21);
        let (carousel, initial) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);
        let picked = carousel.displayed_ids()[0].clone();

        let view = RecordingView::default();
        let shown = view.shown.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut view = view;
            let mut rng = rng;
            run(carousel, initial, rx, &mut view, &mut rng, AUTOPLAY_PERIOD).await
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(shown.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(shown.lock().unwrap().len(), 2);

        tx.send(CarouselEvent::ThumbnailSelected(picked.clone())).unwrap();
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(shown.lock().unwrap().len(), 3);
        assert_eq!(shown.lock().unwrap().last(), Some(&picked));

        tx.send(CarouselEvent::VisibilityChanged(Visibility::Visible)).unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(shown.lock().unwrap().len(), 4);

        drop(tx);
        let carousel = handle.await.unwrap();
        assert_eq!(carousel.playback(), Playback::Autoplaying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_restart_keeps_a_single_timer() {
        let catalog = catalog_of(50);
        let mut rng = StdRng::seed_from_u64(8);
        let (carousel, initial) = GridCarousel::init(&catalog, SAMPLE_SIZE, 600, &mut rng);

        let view = RecordingView::default();
        let shown = view.shown.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut view = view;
            let mut rng = rng;
            run(carousel, initial, rx, &mut view, &mut rng, AUTOPLAY_PERIOD).await
        });

        for _ in 0..3 {
            tx.send(CarouselEvent::VisibilityChanged(Visibility::Visible)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(6100)).await;
        // Initial image plus one image per period, not three.
        assert_eq!(shown.lock().unwrap().len(), 4);

        tx.send(CarouselEvent::VisibilityChanged(Visibility::Hidden)).unwrap();
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(shown.lock().unwrap().len(), 4);

        drop(tx);
        let carousel = handle.await.unwrap();
        assert_eq!(carousel.playback(), Playback::Idle);
    }
}
