// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the beauty pipeline

use frame_beauty::errors::{GraphError, GraphResult, PipelineError};
use frame_beauty::gpu::current_context;
use frame_beauty::media::{I420Buffer, Plane, Rotation, VideoFrame, synthetic_face_frame};
use frame_beauty::stages::{FrameView, LandmarkDetector, LandmarkSet};
use frame_beauty::{
    BeautyError, BeautyPipeline, ComputeBackend, Config, Effect, FrameOutcome, GraphVariant,
    TrackHandle, VideoSink,
};

fn config(variant: GraphVariant) -> Config {
    Config {
        variant,
        backend: ComputeBackend::Software,
        ..Default::default()
    }
}

fn pipeline(variant: GraphVariant) -> BeautyPipeline {
    BeautyPipeline::new(Some(TrackHandle::new("test-track")), config(variant)).unwrap()
}

/// Sum of absolute byte differences over the visible area of one plane
fn plane_difference(a: &I420Buffer, b: &I420Buffer, plane: Plane) -> u64 {
    let (sa, sb) = (a.stride(plane), b.stride(plane));
    let mut total = 0u64;
    for row in 0..plane.rows(a.height()) {
        for col in 0..plane.row_width(a.width()) {
            let x = a.plane(plane)[row * sa + col] as i64;
            let y = b.plane(plane)[row * sb + col] as i64;
            total += (x - y).unsigned_abs();
        }
    }
    total
}

/// Sum of absolute byte differences over every plane
fn plane_distance(a: &I420Buffer, b: &I420Buffer) -> u64 {
    Plane::ALL
        .into_iter()
        .map(|plane| plane_difference(a, b, plane))
        .sum()
}

fn run_effect(variant: GraphVariant, effect: Effect, level: f32) -> (FrameOutcome, I420Buffer) {
    let mut pipeline = pipeline(variant);
    pipeline.params().set(effect, level);
    let mut frame = synthetic_face_frame(128, 128);
    let outcome = pipeline.process(&mut frame);
    (outcome, frame)
}

#[test]
fn test_each_effect_changes_only_at_nonzero_level() {
    let input = synthetic_face_frame(128, 128);
    for variant in GraphVariant::ALL {
        for effect in Effect::ALL {
            let (max_outcome, max_frame) = run_effect(variant, effect, 1.0);
            assert!(
                max_outcome.is_modified(),
                "{} on {} graph: {:?}",
                effect,
                variant,
                max_outcome
            );
            let (_, min_frame) = run_effect(variant, effect, 0.0);

            let max_distance = plane_distance(&input, &max_frame);
            let min_distance = plane_distance(&input, &min_frame);
            assert!(
                min_distance < max_distance,
                "{} on {} graph: min {} vs max {}",
                effect,
                variant,
                min_distance,
                max_distance
            );
            assert_eq!(min_frame, input);
        }
    }
}

#[test]
fn test_output_keeps_dimensions_and_strides() {
    let mut pipeline = pipeline(GraphVariant::Sink);
    pipeline.set_blur_alpha(1.0);
    pipeline.set_lipstick_blend_level(1.0);

    // Re-lay the synthetic face into a buffer with padded rows
    let face = synthetic_face_frame(128, 96);
    let mut frame = I420Buffer::with_strides(128, 96, [160, 80, 72]);
    for plane in Plane::ALL {
        let (src_stride, dst_stride) = (face.stride(plane), frame.stride(plane));
        let width = plane.row_width(128);
        for row in 0..plane.rows(96) {
            frame.plane_mut(plane)[row * dst_stride..row * dst_stride + width]
                .copy_from_slice(&face.plane(plane)[row * src_stride..row * src_stride + width]);
        }
    }

    let outcome = pipeline.process(&mut frame);
    assert!(outcome.is_modified(), "{:?}", outcome);
    assert_eq!((frame.width(), frame.height()), (128, 96));
    assert_eq!(frame.strides(), [160, 80, 72]);
}

/// Copy of `frame` turned half a revolution
fn turned_half(frame: &I420Buffer) -> I420Buffer {
    let (width, height) = (frame.width(), frame.height());
    let mut turned = I420Buffer::new(width, height);
    for plane in Plane::ALL {
        let (cols, rows) = (plane.row_width(width), plane.rows(height));
        let (src_stride, dst_stride) = (frame.stride(plane), turned.stride(plane));
        for row in 0..rows {
            for col in 0..cols {
                turned.plane_mut(plane)[(rows - 1 - row) * dst_stride + (cols - 1 - col)] =
                    frame.plane(plane)[row * src_stride + col];
            }
        }
    }
    turned
}

#[test]
fn test_upside_down_frame_is_beautified_like_upright_one() {
    for variant in GraphVariant::ALL {
        let mut upright = pipeline(variant);
        let mut rotated = pipeline(variant);
        for pipeline in [&upright, &rotated] {
            pipeline.set_face_slim_level(1.0);
            pipeline.set_blur_alpha(1.0);
            pipeline.set_lipstick_blend_level(1.0);
        }

        let mut upright_frame = synthetic_face_frame(128, 96);
        let mut rotated_frame = turned_half(&upright_frame).with_rotation(Rotation::Deg180);
        assert_eq!(rotated_frame.rotation(), Rotation::Deg180);
        assert!(upright.process(&mut upright_frame).is_modified(), "{}", variant);
        assert!(rotated.process(&mut rotated_frame).is_modified(), "{}", variant);

        let expected = turned_half(&upright_frame);
        for plane in Plane::ALL {
            let mean = plane_mean_difference(&expected, &rotated_frame, plane);
            assert!(
                mean <= 1.0,
                "{} graph, {} plane: mean difference {:.2}",
                variant,
                plane,
                mean
            );
        }
    }
}

#[test]
fn test_mid_gray_frame_stays_within_tolerance() {
    for variant in GraphVariant::ALL {
        let mut pipeline = pipeline(variant);
        let input = I420Buffer::filled(64, 64, 128, 128, 128);
        let mut frame = input.clone();
        pipeline.process(&mut frame);
        for plane in Plane::ALL {
            for (a, b) in input.plane(plane).iter().zip(frame.plane(plane)) {
                assert!((*a as i32 - *b as i32).abs() <= 2);
            }
        }

        // With effects on, a gray frame has no face and is left alone
        pipeline.set_white(1.0);
        pipeline.set_blusher_blend_level(1.0);
        let outcome = pipeline.process(&mut frame);
        assert!(matches!(outcome, FrameOutcome::NoFace), "{:?}", outcome);
        assert_eq!(frame, input);
    }
}

#[test]
fn test_processing_is_deterministic() {
    for variant in GraphVariant::ALL {
        let mut results = Vec::new();
        for _ in 0..2 {
            let mut pipeline = pipeline(variant);
            let params = pipeline.params();
            params.set_face_slim_level(0.6);
            params.set_eye_zoom_level(0.4);
            params.set_blur_alpha(0.8);
            params.set_white(0.5);
            params.set_lipstick_blend_level(0.7);
            params.set_blusher_blend_level(0.3);
            let mut frame = synthetic_face_frame(96, 96);
            pipeline.process(&mut frame);
            results.push(frame);
        }
        assert_eq!(results[0], results[1]);
    }
}

#[test]
fn test_null_track_leaves_no_context_current() {
    let result = BeautyPipeline::new(None, config(GraphVariant::Sink));
    assert!(matches!(result, Err(PipelineError::NullTrack)));
    assert_eq!(current_context(), None);
}

#[test]
fn test_context_released_after_each_frame() {
    let mut pipeline = pipeline(GraphVariant::RawData);
    pipeline.set_white(1.0);
    let mut frame = synthetic_face_frame(64, 64);
    pipeline.process(&mut frame);
    assert_eq!(current_context(), None);

    // Another thread can drive the pipeline once this one is done
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let mut frame = synthetic_face_frame(64, 64);
            assert!(pipeline.process(&mut frame).is_modified());
        });
    });
}

#[test]
fn test_out_of_range_levels_clamp_and_frames_continue() {
    let mut pipeline = pipeline(GraphVariant::Sink);
    assert_eq!(pipeline.set_face_slim_level(5.0), 1.0);
    assert_eq!(pipeline.set_eye_zoom_level(-2.0), 0.0);
    assert_eq!(pipeline.set_white(f32::NAN), 0.0);
    assert_eq!(pipeline.params().get(Effect::FaceSlim), 1.0);

    let mut frame = synthetic_face_frame(64, 64);
    assert!(pipeline.process(&mut frame).is_modified());
    let stats = pipeline.stats();
    assert_eq!(stats.frames_processed, 1);
    assert_eq!(stats.frames_beautified, 1);
    assert!(stats.last_frame_time.is_some());
}

#[test]
fn test_setters_from_other_thread() {
    let mut pipeline = pipeline(GraphVariant::Sink);
    let params = pipeline.params();
    std::thread::spawn(move || {
        params.set_lipstick_blend_level(1.0);
    })
    .join()
    .unwrap();

    let mut frame = synthetic_face_frame(64, 64);
    assert!(pipeline.process(&mut frame).is_modified());
}

struct NoFaceDetector;

impl LandmarkDetector for NoFaceDetector {
    fn name(&self) -> &str {
        "no-face"
    }

    fn detect(&mut self, _view: &FrameView<'_>, landmarks: &mut LandmarkSet) -> GraphResult<()> {
        landmarks.clear();
        Ok(())
    }
}

struct FailingDetector;

impl LandmarkDetector for FailingDetector {
    fn name(&self) -> &str {
        "failing"
    }

    fn detect(&mut self, _view: &FrameView<'_>, _landmarks: &mut LandmarkSet) -> GraphResult<()> {
        Err(GraphError::Detection("model not loaded".to_string()))
    }
}

/// Returns a set with the wrong number of points
struct PartialDetector;

impl LandmarkDetector for PartialDetector {
    fn name(&self) -> &str {
        "partial"
    }

    fn detect(&mut self, _view: &FrameView<'_>, landmarks: &mut LandmarkSet) -> GraphResult<()> {
        landmarks.set_points(&[[1.0, 1.0]; 5])
    }
}

fn with_detector(variant: GraphVariant, detector: Box<dyn LandmarkDetector>) -> BeautyPipeline {
    let mut pipeline = BeautyPipeline::with_detector(
        Some(TrackHandle::new("test-track")),
        config(variant),
        detector,
    )
    .unwrap();
    for effect in Effect::ALL {
        pipeline.params().set(effect, 1.0);
    }
    pipeline
}

#[test]
fn test_empty_landmarks_leave_frame_untouched() {
    for variant in GraphVariant::ALL {
        let mut pipeline = with_detector(variant, Box::new(NoFaceDetector));
        let input = synthetic_face_frame(64, 64);
        let mut frame = input.clone();
        let outcome = pipeline.process(&mut frame);
        assert!(matches!(outcome, FrameOutcome::NoFace));
        assert_eq!(frame, input);
        assert_eq!(pipeline.stats().frames_without_face, 1);
    }
}

#[test]
fn test_detector_failure_passes_frame_through() {
    for variant in GraphVariant::ALL {
        let mut pipeline = with_detector(variant, Box::new(FailingDetector));
        let input = synthetic_face_frame(64, 64);
        let mut frame = input.clone();
        let outcome = pipeline.process(&mut frame);
        assert!(matches!(
            outcome,
            FrameOutcome::PassedThrough(BeautyError::Graph(GraphError::Detection(_)))
        ));
        assert_eq!(frame, input);
        assert_eq!(pipeline.stats().frames_passed_through, 1);
    }
}

#[test]
fn test_partial_landmarks_pass_frame_through() {
    let mut pipeline = with_detector(GraphVariant::Sink, Box::new(PartialDetector));
    let input = synthetic_face_frame(64, 64);
    let mut frame = input.clone();
    let outcome = pipeline.process(&mut frame);
    assert!(matches!(outcome, FrameOutcome::PassedThrough(_)), "{:?}", outcome);
    assert_eq!(frame, input);
}

#[test]
fn test_video_sink_accepts_null_and_real_frames() {
    let mut pipeline = pipeline(GraphVariant::Sink);
    pipeline.set_white(1.0);

    assert!(matches!(pipeline.on_frame(None), FrameOutcome::PassedThrough(_)));

    let mut frame = synthetic_face_frame(64, 64);
    let outcome = pipeline.on_frame(Some(&mut frame));
    assert!(outcome.is_modified());
    assert_eq!(pipeline.stats().frames_processed, 2);
}

fn plane_mean_difference(a: &I420Buffer, b: &I420Buffer, plane: Plane) -> f64 {
    let pixels = plane.rows(a.height()) * plane.row_width(a.width());
    plane_difference(a, b, plane) as f64 / pixels as f64
}

#[test]
fn test_gpu_pipeline_matches_software_within_tolerance() {
    for variant in GraphVariant::ALL {
        let gpu_config = Config {
            backend: ComputeBackend::Gpu,
            ..config(variant)
        };
        let mut gpu = match BeautyPipeline::new(Some(TrackHandle::new("gpu-track")), gpu_config) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                return;
            }
        };
        assert!(gpu.is_gpu_accelerated());
        let mut cpu = pipeline(variant);

        for effect in Effect::ALL {
            for pipeline in [&gpu, &cpu] {
                for other in Effect::ALL {
                    pipeline.params().set(other, 0.0);
                }
                pipeline.params().set(effect, 0.8);
            }

            let mut gpu_frame = synthetic_face_frame(128, 128);
            let mut cpu_frame = gpu_frame.clone();
            assert!(gpu.process(&mut gpu_frame).is_modified(), "{} on {}", effect, variant);
            assert!(cpu.process(&mut cpu_frame).is_modified(), "{} on {}", effect, variant);

            // Same integer conversion; float kernels may differ by rounding
            for plane in Plane::ALL {
                let mean = plane_mean_difference(&gpu_frame, &cpu_frame, plane);
                assert!(
                    mean <= 2.0,
                    "{} on {} graph, {} plane: mean difference {:.2}",
                    effect,
                    variant,
                    plane,
                    mean
                );
            }
        }
    }
}
