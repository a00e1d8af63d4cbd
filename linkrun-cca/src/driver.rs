use fpga_fields::{BusWord, FieldInterface, HwAccess, Result};
use log::{debug, info};

use crate::fields::{RdField, WrField, X_SIZE, Y_SIZE};
use crate::test_frames::{Collect, TestFrames};

/// Raw word address of the clock strobe register.
const STROBE_ADDRESS: usize = 0;

/// A feature record reported by the accelerator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Feature {
    pub x_left: u16,
    pub x_right: u16,
    pub y_top_seg0: u16,
    pub y_top_seg1: u16,
    pub y_bottom_seg0: u16,
    pub y_bottom_seg1: u16,
    pub x2_sum: u64,
    pub ylow2_sum: u64,
    pub xylow_sum: u64,
    pub x_seg0_sum: u64,
    pub x_seg1_sum: u64,
    pub ylow_seg0_sum: u64,
    pub ylow_seg1_sum: u64,
    pub n_seg0_sum: u64,
    pub n_seg1_sum: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct RunSettings {
    pub frames: usize,
    pub max_clocks: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames streamed to the end.
    pub frames: usize,
    /// Pixels clocked in after the reset sequence.
    pub clocks: u64,
    pub features: u64,
}

/// Clocks pixels into the accelerator and collects the features it reports.
pub struct Driver<H: HwAccess> {
    fpga: FieldInterface<H, WrField, RdField>,
}

impl<H: HwAccess> Driver<H> {
    pub fn new(hw: H) -> Result<Self> {
        Ok(Self {
            fpga: FieldInterface::new(hw)?,
        })
    }

    fn strobe(&mut self) -> Result<()> {
        self.fpga
            .wr_raw(STROBE_ADDRESS, H::WrWord::from_u128_truncating(1))
    }

    /// Holds the accelerator in reset for two lines' worth of clocks, then releases it.
    pub fn reset(&mut self) -> Result<()> {
        // The hardware may still hold a previous run's inputs.
        self.fpga.wr_force_all();
        self.fpga.write(WrField::Rst, true)?;
        self.fpga.write(WrField::DataValid, true)?;
        self.fpga.wr_flush()?;
        for _ in 0..2 * X_SIZE {
            self.strobe()?;
        }
        self.fpga.write(WrField::Rst, false)?;
        self.fpga.write(WrField::DataValid, false)?;
        self.fpga.wr_flush()?;
        self.strobe()?;
        debug!("accelerator reset");
        Ok(())
    }

    /// Presents one pixel and clocks it in.
    pub fn write_collect(&mut self, pixel: &Collect) -> Result<()> {
        self.fpga.write(WrField::Rst, false)?;
        self.fpga.write(WrField::DataValid, true)?;
        self.fpga.write(WrField::InLabel, pixel.in_label)?;
        self.fpga.write(WrField::X, pixel.x)?;
        self.fpga.write(WrField::Y, pixel.y)?;
        self.fpga.write(WrField::HasRed, pixel.has_red)?;
        self.fpga.write(WrField::HasGreen, pixel.has_green)?;
        self.fpga.write(WrField::HasBlue, pixel.has_blue)?;
        self.fpga.wr_flush()?;
        self.strobe()
    }

    /// Returns the current feature record, if the accelerator flags one as valid.
    pub fn read_feature(&mut self) -> Result<Option<Feature>> {
        self.fpga.rd_flush();
        if !self.fpga.read::<bool>(RdField::Valid)? {
            return Ok(None);
        }
        Ok(Some(Feature {
            x_left: self.fpga.read(RdField::XLeft)?,
            x_right: self.fpga.read(RdField::XRight)?,
            y_top_seg0: self.fpga.read(RdField::YTopSeg0)?,
            y_top_seg1: self.fpga.read(RdField::YTopSeg1)?,
            y_bottom_seg0: self.fpga.read(RdField::YBottomSeg0)?,
            y_bottom_seg1: self.fpga.read(RdField::YBottomSeg1)?,
            x2_sum: self.fpga.read(RdField::X2Sum)?,
            ylow2_sum: self.fpga.read(RdField::Ylow2Sum)?,
            xylow_sum: self.fpga.read(RdField::XylowSum)?,
            x_seg0_sum: self.fpga.read(RdField::XSeg0Sum)?,
            x_seg1_sum: self.fpga.read(RdField::XSeg1Sum)?,
            ylow_seg0_sum: self.fpga.read(RdField::YlowSeg0Sum)?,
            ylow_seg1_sum: self.fpga.read(RdField::YlowSeg1Sum)?,
            n_seg0_sum: self.fpga.read(RdField::NSeg0Sum)?,
            n_seg1_sum: self.fpga.read(RdField::NSeg1Sum)?,
        }))
    }

    /// Resets the accelerator and streams `settings.frames` frames through it, one pixel per
    /// clock, until the frames run out or `settings.max_clocks` pixels have been clocked in.
    ///
    /// `on_feature` receives the clock count and each feature record as it is read.
    pub fn run(
        &mut self,
        frames: &TestFrames,
        settings: &RunSettings,
        mut on_feature: impl FnMut(u64, &Feature),
    ) -> Result<RunSummary> {
        self.reset()?;
        let mut summary = RunSummary::default();
        'frames: for frame in 0..settings.frames {
            info!("frame {frame}");
            for y in 0..Y_SIZE {
                for x in 0..X_SIZE {
                    if summary.clocks >= settings.max_clocks {
                        info!("clock limit of {} reached", settings.max_clocks);
                        break 'frames;
                    }
                    self.write_collect(&frames.pixel(frame, x, y))?;
                    summary.clocks += 1;
                    if let Some(feature) = self.read_feature()? {
                        summary.features += 1;
                        on_feature(summary.clocks, &feature);
                    }
                }
            }
            summary.frames += 1;
        }
        Ok(summary)
    }
}
