//! Text-to-image workflow builder.
//!
//! Produces the ComfyUI API-format graph for a single-pass latent diffusion
//! render: checkpoint loader, empty latent, positive and negative text
//! encoders, sampler, VAE decode, and a save node.

use serde_json::{json, Value};

/// Node id of the `SaveImage` node; its output carries the rendered file.
pub const SAVE_NODE_ID: &str = "9";

/// Parameters for one text-to-image render.
#[derive(Debug, Clone, PartialEq)]
pub struct Txt2ImgWorkflow {
    pub checkpoint: String,
    pub positive: String,
    pub negative: String,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub steps: u32,
    pub cfg: f32,
    pub sampler: String,
    pub scheduler: String,
    pub filename_prefix: String,
}

impl Txt2ImgWorkflow {
    /// Workflow with sampler defaults matching the stock ComfyUI graph.
    pub fn new(checkpoint: impl Into<String>, positive: impl Into<String>) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            positive: positive.into(),
            negative: String::new(),
            width: 512,
            height: 512,
            seed: 0,
            steps: 20,
            cfg: 7.0,
            sampler: "euler".to_string(),
            scheduler: "normal".to_string(),
            filename_prefix: "storyloom".to_string(),
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn cfg(mut self, cfg: f32) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn negative(mut self, negative: impl Into<String>) -> Self {
        self.negative = negative.into();
        self
    }

    /// Render the API-format graph.
    pub fn to_json(&self) -> Value {
        json!({
            "3": {
                "class_type": "KSampler",
                "inputs": {
                    "seed": self.seed,
                    "steps": self.steps,
                    "cfg": self.cfg,
                    "sampler_name": self.sampler,
                    "scheduler": self.scheduler,
                    "denoise": 1.0,
                    "model": ["4", 0],
                    "positive": ["6", 0],
                    "negative": ["7", 0],
                    "latent_image": ["5", 0]
                }
            },
            "4": {
                "class_type": "CheckpointLoaderSimple",
                "inputs": { "ckpt_name": self.checkpoint }
            },
            "5": {
                "class_type": "EmptyLatentImage",
                "inputs": { "width": self.width, "height": self.height, "batch_size": 1 }
            },
            "6": {
                "class_type": "CLIPTextEncode",
                "inputs": { "text": self.positive, "clip": ["4", 1] }
            },
            "7": {
                "class_type": "CLIPTextEncode",
                "inputs": { "text": self.negative, "clip": ["4", 1] }
            },
            "8": {
                "class_type": "VAEDecode",
                "inputs": { "samples": ["3", 0], "vae": ["4", 2] }
            },
            SAVE_NODE_ID: {
                "class_type": "SaveImage",
                "inputs": { "filename_prefix": self.filename_prefix, "images": ["8", 0] }
            }
        })
    }
}
