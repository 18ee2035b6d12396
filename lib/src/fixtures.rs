//! Notebook documents shared by unit tests.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::field::ImageKinds;
use crate::notebook::Notebook;
use crate::schema::Schema;

pub fn schema() -> Arc<Schema> {
    Arc::new(Schema::notebook(ImageKinds::default()).unwrap())
}

pub fn markdown(lines: &[&str]) -> Value {
    json!({ "cell_type": "markdown", "source": lines })
}

/// A six-cell notebook with the given title and author lines, and a PNG
/// output when `image` is set.
pub fn document(title: &str, author: &str, image: bool) -> Value {
    let outputs = match image {
        true => json!([{ "data": { "image/png": "iVBORw0KGgo=", "text/plain": "<Figure>" } }]),
        false => json!([{ "data": { "text/plain": "42" } }]),
    };

    json!({
        "cells": [
            markdown(&[title]),
            markdown(&[author]),
            markdown(&["A *short* description\n", "over two lines."]),
            markdown(&["### References\n", "- A\n", "- B\n"]),
            markdown(&["### Keywords\n", "- plots, physics\n", "- waves"]),
            markdown(&["### Requirements\n", "* numpy\n"]),
            { "cell_type": "code", "source": ["plot()"], "outputs": outputs },
        ],
        "metadata": {},
        "nbformat": 4,
    })
}

pub fn valid(filename: &str) -> Notebook {
    Notebook::new(filename, document("# Title\n", "## Author: Jane Doe\n", true), schema())
}

/// Bad title and no thumbnail.
pub fn invalid(filename: &str) -> Notebook {
    Notebook::new(filename, document("## Title\n", "## Author: Jane Doe\n", false), schema())
}
