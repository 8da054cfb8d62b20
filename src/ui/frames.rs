use gtk4::prelude::*;
use gtk4::{gdk, glib};

use crate::analysis::TopFrame;

const THUMB_WIDTH: i32 = 280;
const THUMB_HEIGHT: i32 = 160;

pub fn clear(flow: &gtk4::FlowBox) {
    flow.remove_all();
}

/// One card per frame: the visualization (when it decodes) and its numbers.
pub fn fill(flow: &gtk4::FlowBox, frames: &[TopFrame]) {
    clear(flow);
    for frame in frames {
        flow.append(&frame_card(frame));
    }
}

fn frame_card(frame: &TopFrame) -> gtk4::Box {
    let card = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
    card.add_css_class("card");

    match frame_texture(frame) {
        Some(texture) => {
            let picture = gtk4::Picture::for_paintable(&texture);
            picture.set_content_fit(gtk4::ContentFit::Cover);
            picture.set_size_request(THUMB_WIDTH, THUMB_HEIGHT);
            card.append(&picture);
        }
        None => {
            let missing = gtk4::Label::new(Some("No visualization"));
            missing.add_css_class("dim-label");
            missing.set_size_request(THUMB_WIDTH, THUMB_HEIGHT);
            card.append(&missing);
        }
    }

    let info = gtk4::Box::new(gtk4::Orientation::Vertical, 2);
    info.set_margin_start(10);
    info.set_margin_end(10);
    info.set_margin_top(6);
    info.set_margin_bottom(10);
    for line in [
        format!("Frame: {}", frame.frame_number),
        format!("Prediction: {}", frame.prediction),
        format!("Confidence: {}", frame.confidence_text()),
    ] {
        let label = gtk4::Label::new(Some(&line));
        label.set_xalign(0.0);
        info.append(&label);
    }
    card.append(&info);
    card
}

fn frame_texture(frame: &TopFrame) -> Option<gdk::Texture> {
    let bytes = frame.visualization_bytes()?;
    match gdk::Texture::from_bytes(&glib::Bytes::from_owned(bytes)) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::debug!("Frame {} visualization is not an image: {e}", frame.frame_number);
            None
        }
    }
}
