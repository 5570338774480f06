//! Image and screenshot transfer.
//!
//! With the image transfer protocol, custom waypoint symbols and similar
//! image slots can be downloaded and (for writable slots) replaced. The
//! screenshot transfer captures the device's display. Both produce a
//! [`Bitmap`]: a bare carrier of dimensions, color depth, palette, and
//! unpadded top-down pixel rows. File-format encoding is out of scope
//! here; the caller converts.
//!
//! On the wire both protocols move DIB-style pixel arrays: rows are stored
//! bottom-up and padded to a multiple of four bytes. Reassembly strips the
//! padding and flips the row order.

use crate::command::Command;
use crate::datatype::{
    IMAGE_CHUNK, IMAGE_COLOR_TABLE, IMAGE_ID, IMAGE_INFORMATION_HEADER, IMAGE_LIST, IMAGE_NAME,
    SCREENSHOT_CHUNK, SCREENSHOT_COLOR, SCREENSHOT_HEADER,
};
use crate::error::{GarminError, ProtocolError};
use crate::link::Pid;
use crate::schema::Value;
use crate::semantic::{latin1_to_string, ScreenshotSection};
use crate::transfer::{Progress, Transfer};
use num_enum::TryFromPrimitive;
use tracing::{debug, info};

/// Pixel payload cap of one image data packet: 500 bytes of packet data
/// minus the 4-byte image id.
const IMAGE_CHUNK_SIZE: usize = 496;

/// The screenshot pixel stream carries at most this many bytes per packet;
/// wider rows span several packets.
const SCREEN_CHUNK_SIZE: usize = 128;

/// The fixed grayscale palette assumed for 2-bpp screenshots, which ship
/// without a color table.
const GRAY_PALETTE: [[u8; 3]; 4] = [[255, 255, 255], [192, 192, 192], [128, 128, 128], [0, 0, 0]];

/// A decoded image: unpadded pixel rows, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
    /// RGB entries; empty for depths above 8 bpp.
    pub palette: Vec<[u8; 3]>,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Bytes per unpadded row.
    pub fn row_size(&self) -> usize {
        (self.width * self.bpp) as usize / 8
    }
}

/// An image type (a category of image slots).
#[derive(Debug, Clone)]
pub struct ImageType {
    pub idx: u8,
    pub name: String,
}

/// One image slot from the device's image list.
#[derive(Debug, Clone)]
pub struct ImageSlot {
    pub idx: u16,
    pub writable: bool,
    pub image_type: u8,
    pub name: String,
}

/// Dimensions and color layout of one image slot.
#[derive(Debug, Clone, Copy)]
pub struct ImageProperties {
    pub bpp: u16,
    pub width: u16,
    pub height: u16,
    /// Row width in bytes including the padding to a 4-byte multiple.
    pub bytewidth: u16,
    /// The transparent color, when one is set.
    pub transparent: Option<[u8; 3]>,
}

impl ImageProperties {
    pub fn row_size(&self) -> usize {
        usize::from(self.width) * usize::from(self.bpp) / 8
    }

    pub fn byte_size(&self) -> usize {
        usize::from(self.bytewidth) * usize::from(self.height)
    }

    /// Size of the color table, zero for true color. Anything but
    /// 1/2/4/8/24 bpp is unsupported.
    pub fn colors_used(&self) -> Result<usize, ProtocolError> {
        colors_used(u32::from(self.bpp))
    }
}

fn colors_used(bpp: u32) -> Result<usize, ProtocolError> {
    match bpp {
        1 | 2 | 4 | 8 => Ok(1 << bpp),
        24 => Ok(0),
        other => Err(ProtocolError::UnsupportedColorDepth(other)),
    }
}

/// Flip a bottom-up padded pixel array into top-down unpadded rows.
fn rows_top_down(pixel_array: &[u8], bytewidth: usize, row_size: usize) -> Vec<u8> {
    if bytewidth == 0 {
        return pixel_array.to_vec();
    }
    let mut pixels = Vec::with_capacity(pixel_array.len());
    for row in pixel_array.chunks(bytewidth).rev() {
        pixels.extend_from_slice(&row[..row_size.min(row.len())]);
    }
    pixels
}

/// Ask for the list of image type indices, then each type's name.
pub async fn get_image_types(transfer: &mut Transfer<'_>) -> Result<Vec<ImageType>, GarminError> {
    info!("Request image types");
    transfer.link.send_packet(Pid::ImageTypeIdxRx, Vec::new()).await?;
    let packet = transfer.link.expect_packet(Pid::ImageTypeIdxTx).await?;
    let indices: Vec<u8> = packet.data.to_vec();
    let mut types = Vec::with_capacity(indices.len());
    for idx in indices {
        transfer
            .link
            .send_u16(Pid::ImageTypeNameRx, u16::from(idx))
            .await?;
        let packet = transfer.link.expect_packet(Pid::ImageTypeNameTx).await?;
        let record = IMAGE_NAME.unpack(&packet.data)?;
        let name = record
            .get("name")
            .and_then(Value::as_bytes)
            .map(latin1_to_string)
            .unwrap_or_default();
        info!("Image type name: {name}");
        types.push(ImageType { idx, name });
    }
    Ok(types)
}

/// Enumerate the image slots and their names.
pub async fn get_image_list(transfer: &mut Transfer<'_>) -> Result<Vec<ImageSlot>, GarminError> {
    info!("Request image list");
    transfer.link.send_packet(Pid::ImageListRx, Vec::new()).await?;
    let packet = transfer.link.expect_packet(Pid::ImageListTx).await?;
    let record = IMAGE_LIST.unpack(&packet.data)?;
    let mut slots = Vec::new();
    let entries = record.get("images").and_then(Value::as_list).unwrap_or(&[]);
    for entry in entries {
        let Some([Value::U16(idx), Value::Bool(writable), Value::U8(image_type)]) =
            entry.as_tuple()
        else {
            continue;
        };
        transfer.link.send_u16(Pid::ImageNameRx, *idx).await?;
        let packet = transfer.link.expect_packet(Pid::ImageNameTx).await?;
        let name_record = IMAGE_NAME.unpack(&packet.data)?;
        let name = name_record
            .get("name")
            .and_then(Value::as_bytes)
            .map(latin1_to_string)
            .unwrap_or_default();
        info!("Image name: {name}");
        slots.push(ImageSlot {
            idx: *idx,
            writable: *writable,
            image_type: *image_type,
            name,
        });
    }
    Ok(slots)
}

/// Fetch the properties of one image slot.
pub async fn get_image_properties(
    transfer: &mut Transfer<'_>,
    idx: u16,
) -> Result<ImageProperties, GarminError> {
    info!("Request image properties");
    transfer.link.send_u16(Pid::ImagePropsRx, idx).await?;
    let packet = transfer.link.expect_packet(Pid::ImagePropsTx).await?;
    if packet.data.is_empty() {
        return Err(ProtocolError::InvalidImageIndex(idx).into());
    }
    let record = IMAGE_INFORMATION_HEADER.unpack(&packet.data)?;
    let color = record.get("color").and_then(Value::as_tuple).and_then(|c| match c {
        [Value::U8(r), Value::U8(g), Value::U8(b), Value::U8(a)] => {
            // An all-zero color means no transparency.
            (*r != 0 || *g != 0 || *b != 0 || *a != 0).then_some([*r, *g, *b])
        }
        _ => None,
    });
    let properties = ImageProperties {
        bpp: record.get("bpp").and_then(Value::as_u8).map(u16::from).unwrap_or(0),
        width: record.get("width").and_then(Value::as_u16).unwrap_or(0),
        height: record.get("height").and_then(Value::as_u16).unwrap_or(0),
        bytewidth: record.get("bytewidth").and_then(Value::as_u16).unwrap_or(0),
        transparent: color,
    };
    info!("Dimensions: {}x{} pixels", properties.width, properties.height);
    info!("Color depth: {} bits per pixel", properties.bpp);
    Ok(properties)
}

async fn get_image_id(transfer: &mut Transfer<'_>, idx: u16) -> Result<u32, GarminError> {
    info!("Request image ID");
    transfer.link.send_u16(Pid::ImageIdRx, idx).await?;
    let packet = transfer.link.expect_packet(Pid::ImageIdTx).await?;
    let record = IMAGE_ID.unpack(&packet.data)?;
    let id = record.get("id").and_then(Value::as_u32).unwrap_or(0);
    debug!("Image ID: {id}");
    Ok(id)
}

async fn get_color_table(
    transfer: &mut Transfer<'_>,
    image_id: u32,
) -> Result<Vec<[u8; 3]>, GarminError> {
    info!("Request color table for image ID {image_id}");
    transfer
        .link
        .send_packet(Pid::ColorTableRx, image_id.to_le_bytes().to_vec())
        .await?;
    let packet = transfer.link.expect_packet(Pid::ColorTableTx).await?;
    let record = IMAGE_COLOR_TABLE.unpack(&packet.data)?;
    let colors = record
        .get("colors")
        .and_then(Value::as_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|color| match color.as_tuple() {
            Some([Value::U8(r), Value::U8(g), Value::U8(b), Value::U8(_)]) => Some([*r, *g, *b]),
            _ => None,
        })
        .collect();
    Ok(colors)
}

async fn put_color_table(
    transfer: &mut Transfer<'_>,
    image_id: u32,
    palette: &[[u8; 3]],
) -> Result<(), GarminError> {
    info!("Send color table for image ID {image_id}");
    let colors: Vec<Value> = palette
        .iter()
        .map(|&[r, g, b]| {
            Value::Tuple(vec![Value::U8(r), Value::U8(g), Value::U8(b), Value::U8(0)])
        })
        .collect();
    let record = IMAGE_COLOR_TABLE.record(vec![Value::U32(image_id), Value::List(colors)])?;
    transfer
        .link
        .send_packet(Pid::ColorTableTx, IMAGE_COLOR_TABLE.pack(&record)?)
        .await?;
    let packet = transfer.link.expect_packet(Pid::ColorTableRx).await?;
    let echoed = IMAGE_ID
        .unpack(&packet.data)?
        .get("id")
        .and_then(Value::as_u32)
        .unwrap_or(0);
    if echoed != image_id {
        return Err(ProtocolError::ImageIdMismatch { expected: image_id, got: echoed }.into());
    }
    Ok(())
}

/// Download one image slot.
pub async fn get_image(
    transfer: &mut Transfer<'_>,
    idx: u16,
    mut progress: Progress<'_>,
) -> Result<Bitmap, GarminError> {
    info!("Request image {idx}...");
    let properties = get_image_properties(transfer, idx).await?;
    let colors_used = properties.colors_used()?;
    let image_id = get_image_id(transfer, idx).await?;
    let palette = if colors_used == 0 {
        debug!("{}-bit color depth has no color table", properties.bpp);
        Vec::new()
    } else {
        // The table can hold more colors than the depth can address.
        let mut palette = get_color_table(transfer, image_id).await?;
        palette.truncate(colors_used);
        palette
    };

    let byte_size = properties.byte_size();
    let chunk_count = byte_size.div_ceil(IMAGE_CHUNK_SIZE);
    info!("Image: Expecting {chunk_count} chunks");
    let mut pixel_array: Vec<u8> = Vec::with_capacity(byte_size);
    for index in 0..chunk_count {
        transfer
            .link
            .send_packet(Pid::ImageDataRx, image_id.to_le_bytes().to_vec())
            .await?;
        let packet = transfer.link.expect_packet(Pid::ImageDataTx).await?;
        let record = IMAGE_CHUNK.unpack(&packet.data)?;
        if let Some(chunk) = record.get("chunk").and_then(Value::as_bytes) {
            pixel_array.extend_from_slice(chunk);
        }
        if let Some(callback) = progress.as_mut() {
            callback(index + 1, chunk_count);
        }
    }
    transfer
        .link
        .send_packet(Pid::ImageDataCmplt, image_id.to_le_bytes().to_vec())
        .await?;
    info!("Completed request pixel array for image ID {image_id}");

    let pixels = rows_top_down(
        &pixel_array,
        usize::from(properties.bytewidth),
        properties.row_size(),
    );
    Ok(Bitmap {
        width: u32::from(properties.width),
        height: u32::from(properties.height),
        bpp: u32::from(properties.bpp),
        palette,
        pixels,
    })
}

/// Upload a bitmap into a writable image slot.
///
/// The bitmap must already match the slot's dimensions, color depth, and
/// (for indexed depths) palette; the palette in use is retrieved from the
/// device and echoed back, never replaced.
pub async fn put_image(
    transfer: &mut Transfer<'_>,
    idx: u16,
    bitmap: &Bitmap,
    mut progress: Progress<'_>,
) -> Result<(), GarminError> {
    let properties = get_image_properties(transfer, idx).await?;
    let colors_used = properties.colors_used()?;
    if u32::from(properties.bpp) != bitmap.bpp {
        return Err(ProtocolError::Invalid(format!(
            "image has wrong color depth: expected {} bpp, got {} bpp",
            properties.bpp, bitmap.bpp
        ))
        .into());
    }
    if u32::from(properties.width) != bitmap.width || u32::from(properties.height) != bitmap.height
    {
        return Err(ProtocolError::Invalid(format!(
            "image has wrong dimensions: expected {}x{} pixels, got {}x{} pixels",
            properties.width, properties.height, bitmap.width, bitmap.height
        ))
        .into());
    }
    let image_id = get_image_id(transfer, idx).await?;
    if colors_used > 0 {
        let mut palette = get_color_table(transfer, image_id).await?;
        palette.truncate(colors_used);
        if bitmap.palette != palette {
            return Err(ProtocolError::Invalid("image has the wrong color palette".into()).into());
        }
        put_color_table(transfer, image_id, &palette).await?;
    }

    let row_size = properties.row_size();
    if row_size == 0 {
        return Err(ProtocolError::Invalid("image slot reports a zero-byte row".into()).into());
    }
    let bytewidth = usize::from(properties.bytewidth);
    let padding = vec![0u8; bytewidth.saturating_sub(row_size)];
    let total = properties.height as usize;
    info!("Send pixel array for image ID {image_id}");
    // Rows go back out bottom-up, each padded to the device's bytewidth.
    for (index, row) in bitmap.pixels.chunks(row_size).rev().enumerate() {
        let mut chunk = row.to_vec();
        chunk.extend_from_slice(&padding);
        let record = IMAGE_CHUNK.record(vec![Value::U32(image_id), Value::Bytes(chunk)])?;
        transfer
            .link
            .send_packet(Pid::ImageDataTx, IMAGE_CHUNK.pack(&record)?)
            .await?;
        if let Some(callback) = progress.as_mut() {
            callback(index + 1, total);
        }
        let packet = transfer.link.expect_packet(Pid::ImageDataRx).await?;
        let echoed = IMAGE_ID
            .unpack(&packet.data)?
            .get("id")
            .and_then(Value::as_u32)
            .unwrap_or(0);
        if echoed != image_id {
            return Err(ProtocolError::ImageIdMismatch { expected: image_id, got: echoed }.into());
        }
    }
    transfer
        .link
        .send_packet(Pid::ImageDataCmplt, image_id.to_le_bytes().to_vec())
        .await?;
    info!("Completed send pixel array for image ID {image_id}");
    Ok(())
}

fn expect_section(got: u32, expected: ScreenshotSection) -> Result<(), ProtocolError> {
    let got = ScreenshotSection::try_from_primitive(got)
        .map(ScreenshotSection::name)
        .unwrap_or("unknown");
    if got != expected.name() {
        return Err(ProtocolError::UnexpectedSection { expected: expected.name(), got });
    }
    Ok(())
}

/// Capture the device's display.
pub async fn get_screenshot(
    transfer: &mut Transfer<'_>,
    mut progress: Progress<'_>,
) -> Result<Bitmap, GarminError> {
    info!("Request screenshot...");
    transfer.send_command(Command::TransferScreen).await?;
    info!("Expect screen data");
    let packet = transfer.link.expect_packet(Pid::ScreenData).await?;
    let header = SCREENSHOT_HEADER.unpack(&packet.data)?;
    expect_section(
        header.get("section").and_then(Value::as_u32).unwrap_or(9),
        ScreenshotSection::Header,
    )?;
    let bpp = header.get("bpp").and_then(Value::as_u32).unwrap_or(0);
    let width = header.get("width").and_then(Value::as_u32).unwrap_or(0);
    let height = header.get("height").and_then(Value::as_u32).unwrap_or(0);
    let bytewidth = header.get("bytewidth").and_then(Value::as_u32).unwrap_or(0) as usize;
    info!("Dimensions: {width}x{height} pixels");
    info!("Color depth: {bpp} bits per pixel");

    // Unlike the image slots, screenshots also come in 16- and 32-bit
    // variants on some devices; anything deeper than 8 bpp has no table.
    // The 2-bpp format omits its table too and implies fixed grayscale.
    let palette_size = match bpp {
        1 | 4 | 8 => 1usize << bpp,
        2 | 16 | 24 | 32 => 0,
        other => return Err(ProtocolError::UnsupportedColorDepth(other).into()),
    };
    let pixel_packets = bytewidth.div_ceil(SCREEN_CHUNK_SIZE) * height as usize;
    let total = palette_size + pixel_packets;
    let mut done = 0usize;

    let mut palette: Vec<[u8; 3]> = if bpp == 2 {
        GRAY_PALETTE.to_vec()
    } else {
        Vec::with_capacity(palette_size)
    };
    for _ in 0..palette_size {
        let packet = transfer.link.expect_packet(Pid::ScreenData).await?;
        let record = SCREENSHOT_COLOR.unpack(&packet.data)?;
        expect_section(
            record.get("section").and_then(Value::as_u32).unwrap_or(9),
            ScreenshotSection::ColorTable,
        )?;
        if let Some([Value::U8(blue), Value::U8(green), Value::U8(red)]) =
            record.get("color").and_then(Value::as_tuple)
        {
            palette.push([*red, *green, *blue]);
        }
        done += 1;
        if let Some(callback) = progress.as_mut() {
            callback(done, total);
        }
    }

    info!("Expect pixel array");
    let mut pixel_array = Vec::with_capacity(bytewidth * height as usize);
    for _ in 0..pixel_packets {
        let packet = transfer.link.expect_packet(Pid::ScreenData).await?;
        let record = SCREENSHOT_CHUNK.unpack(&packet.data)?;
        expect_section(
            record.get("section").and_then(Value::as_u32).unwrap_or(9),
            ScreenshotSection::PixelArray,
        )?;
        if let Some(chunk) = record.get("chunk").and_then(Value::as_bytes) {
            pixel_array.extend_from_slice(chunk);
        }
        done += 1;
        if let Some(callback) = progress.as_mut() {
            callback(done, total);
        }
    }

    let row_size = (width * bpp) as usize / 8;
    let pixels = rows_top_down(&pixel_array, bytewidth, row_size);
    Ok(Bitmap { width, height, bpp, palette, pixels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandProtocol;
    use crate::link::{Link, LinkProtocol};
    use crate::packet::Packet;
    use crate::physical::{MockPhysical, PhysicalLayer};

    fn link_with(packets: Vec<Packet>) -> Link {
        let mut link = Link::new(PhysicalLayer::Mock(MockPhysical::new(packets)));
        link.protocol = LinkProtocol::L001;
        link
    }

    fn props_packet(bpp: u8, width: u16, height: u16, bytewidth: u16) -> Packet {
        let mut data = vec![0u8, bpp];
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&bytewidth.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&[255, 0, 255, 0]); // magenta transparency
        Packet::new(880, data)
    }

    #[test]
    fn row_flip_strips_padding() {
        // Two rows of 3 bytes padded to 4, stored bottom-up.
        let pixel_array = [9, 9, 9, 0, 1, 1, 1, 0];
        assert_eq!(rows_top_down(&pixel_array, 4, 3), vec![1, 1, 1, 9, 9, 9]);
    }

    #[test]
    fn unsupported_depth_is_fatal() {
        assert!(colors_used(16).is_err());
        assert_eq!(colors_used(8).unwrap(), 256);
        assert_eq!(colors_used(24).unwrap(), 0);
    }

    #[tokio::test]
    async fn image_properties_decode() {
        let mut link = link_with(vec![props_packet(8, 16, 16, 16)]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let props = get_image_properties(&mut transfer, 3).await.unwrap();
        assert_eq!(props.bpp, 8);
        assert_eq!(props.width, 16);
        assert_eq!(props.transparent, Some([255, 0, 255]));
        assert_eq!(props.colors_used().unwrap(), 256);
    }

    #[tokio::test]
    async fn invalid_image_index_is_an_error() {
        let mut link = link_with(vec![Packet::empty(880)]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let err = get_image_properties(&mut transfer, 99).await.unwrap_err();
        assert!(matches!(
            err,
            GarminError::Protocol(ProtocolError::InvalidImageIndex(99))
        ));
    }

    #[tokio::test]
    async fn screenshot_two_bpp_uses_gray_palette() {
        // 4x2 pixels at 2 bpp: row_size 1 byte, bytewidth 4, two pixel
        // packets, no color table.
        let mut header = Vec::new();
        header.extend_from_slice(&0u32.to_le_bytes()); // section: header
        header.extend_from_slice(&0u32.to_le_bytes()); // offset
        header.extend_from_slice(&4u32.to_le_bytes()); // bytewidth
        header.extend_from_slice(&2u32.to_le_bytes()); // bpp
        header.extend_from_slice(&4u32.to_le_bytes()); // width
        header.extend_from_slice(&2u32.to_le_bytes()); // height
        header.extend_from_slice(&[0u8; 12]);
        let chunk = |offset: u32, data: &[u8]| {
            let mut v = Vec::new();
            v.extend_from_slice(&1u32.to_le_bytes()); // section: pixel array
            v.extend_from_slice(&offset.to_le_bytes());
            v.extend_from_slice(data);
            Packet::new(69, v)
        };
        let mut link = link_with(vec![
            Packet::new(69, header),
            chunk(0, &[0b11_10_01_00, 0, 0, 0]),
            chunk(4, &[0b00_01_10_11, 0, 0, 0]),
        ]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let bitmap = get_screenshot(&mut transfer, None).await.unwrap();
        assert_eq!(bitmap.palette.len(), 4);
        assert_eq!(bitmap.palette[0], [255, 255, 255]);
        assert_eq!(bitmap.width, 4);
        // Bottom row first on the wire, so it ends up last after the flip.
        assert_eq!(bitmap.pixels, vec![0b00_01_10_11, 0b11_10_01_00]);
    }

    #[tokio::test]
    async fn screenshot_out_of_order_section_is_an_error() {
        let mut header = Vec::new();
        header.extend_from_slice(&1u32.to_le_bytes()); // pixel array first
        header.extend_from_slice(&[0u8; 32]);
        let mut link = link_with(vec![Packet::new(69, header)]);
        let mut transfer = Transfer::new(&mut link, CommandProtocol::A010);
        let err = get_screenshot(&mut transfer, None).await.unwrap_err();
        assert!(matches!(
            err,
            GarminError::Protocol(ProtocolError::UnexpectedSection { expected: "header", .. })
        ));
    }
}
