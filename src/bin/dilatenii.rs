//! Commandline utility to dilate a cortical ROI into the neighbouring white matter.
//!
//! Takes a 5tt tissue segmentation (white matter at volume index 2), an
//! independent mask and a seed ROI, all co-registered, grows the ROI until
//! it overlaps the masked white matter enough, and saves the merged ROI
//! with the original affine and header.

use clap::Parser;
use ndarray::prelude::*;
use ndarray::{Array3, Ix3, Ix4};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::fs;
use std::path::Path;

use parcelnii::dilate::dilate_cortex;

// use clap to create commandline interface
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// the 5tt tissue segmentation in DWI space (*.nii.gz)
    #[arg(long = "hsvs_5tt")]
    hsvs_5tt: String,

    /// the input mask (*.nii.gz)
    #[arg(long)]
    mask: String,

    /// the input ROI to modify (*.nii.gz)
    #[arg(long = "in")]
    input: String,

    /// the output ROI filename to save to (*.nii.gz)
    #[arg(long)]
    out: String,
}

/// Reads a nifti file as a 3D f64 array together with its header.
fn read_volume_3d(path: &str) -> (Array3<f64>, NiftiHeader) {
    let obj = ReaderOptions::new().read_file(path).unwrap_or_else(|e| {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    });
    let header = obj.header().clone();
    let img = obj.volume().into_ndarray::<f64>().unwrap_or_else(|e| {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    });
    if img.ndim() != 3 {
        eprintln!("Error! {} must be a 3D volume.", path);
        std::process::exit(-2);
    }
    let img = img.into_dimensionality::<Ix3>().unwrap_or_else(|e| {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    });
    (img, header)
}

/// Reads the 5tt segmentation and extracts the white-matter volume
/// (index 2 along the 4th axis).
fn read_white_matter(path: &str) -> Array3<f64> {
    let obj = ReaderOptions::new().read_file(path).unwrap_or_else(|e| {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    });
    let img = obj.volume().into_ndarray::<f64>().unwrap_or_else(|e| {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    });
    if img.ndim() != 4 {
        eprintln!("Error! The 5tt input must be a 4D volume of tissue classes.");
        std::process::exit(-2);
    }
    let img = img.into_dimensionality::<Ix4>().unwrap_or_else(|e| {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    });
    if img.shape()[3] < 3 {
        eprintln!("Error! The 5tt input has no white-matter volume at index 2.");
        std::process::exit(-2);
    }
    img.index_axis(Axis(3), 2).to_owned()
}

/// Main function that parses commandline arguments and runs the program.
///
/// Reads the three co-registered inputs, runs the adaptive dilation and
/// saves the merged ROI with the seed ROI's affine and header.
fn main() {
    let cli = Args::parse();
    let output_path = Path::new(&cli.out);

    // make sure the output directory exists before doing any work
    if let Some(out_dir) = output_path.parent() {
        if !out_dir.as_os_str().is_empty() {
            fs::create_dir_all(out_dir).unwrap_or_else(|e| {
                eprintln!("Error! {}", e);
                std::process::exit(-2);
            });
        }
    }

    let wm = read_white_matter(&cli.hsvs_5tt);
    let (mask, _) = read_volume_3d(&cli.mask);
    let (roi, roi_header) = read_volume_3d(&cli.input);

    println!("Dilating ROI into the masked white matter...");
    let out = dilate_cortex(wm.view(), mask.view(), roi.view()).unwrap_or_else(|e| {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    });
    println!(
        "Final ROI volume: {} voxels",
        out.iter().filter(|&&v| v > 0.0).count()
    );

    // save with the original ROI's affine and header
    WriterOptions::new(output_path)
        .reference_header(&roi_header)
        .write_nifti(&out)
        .unwrap_or_else(|e| {
            eprintln!("Error! {}", e);
            std::process::exit(-2);
        });
}
