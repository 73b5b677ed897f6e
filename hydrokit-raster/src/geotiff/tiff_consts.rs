// Field types
pub const DT_BYTE: u16 = 1;
pub const DT_ASCII: u16 = 2;
pub const DT_SHORT: u16 = 3;
pub const DT_LONG: u16 = 4;
pub const DT_RATIONAL: u16 = 5;
pub const DT_SBYTE: u16 = 6;
pub const DT_UNDEFINED: u16 = 7;
pub const DT_SSHORT: u16 = 8;
pub const DT_SLONG: u16 = 9;
pub const DT_SRATIONAL: u16 = 10;
pub const DT_FLOAT: u16 = 11;
pub const DT_DOUBLE: u16 = 12;
pub const DT_IFD: u16 = 13;
pub const DT_TIFF_LONG8: u16 = 16;
pub const DT_TIFF_SLONG8: u16 = 17;
pub const DT_TIFF_IFD8: u16 = 18;

// Baseline tags
pub const TAG_IMAGEWIDTH: u16 = 256;
pub const TAG_IMAGELENGTH: u16 = 257;
pub const TAG_BITSPERSAMPLE: u16 = 258;
pub const TAG_COMPRESSION: u16 = 259;
pub const TAG_PHOTOMETRICINTERPRETATION: u16 = 262;
pub const TAG_STRIPOFFSETS: u16 = 273;
pub const TAG_SAMPLESPERPIXEL: u16 = 277;
pub const TAG_ROWSPERSTRIP: u16 = 278;
pub const TAG_STRIPBYTECOUNTS: u16 = 279;
pub const TAG_PLANARCONFIGURATION: u16 = 284;
pub const TAG_SOFTWARE: u16 = 305;
pub const TAG_DATETIME: u16 = 306;
pub const TAG_PREDICTOR: u16 = 317;
pub const TAG_TILEWIDTH: u16 = 322;
pub const TAG_TILELENGTH: u16 = 323;
pub const TAG_TILEOFFSETS: u16 = 324;
pub const TAG_TILEBYTECOUNTS: u16 = 325;
pub const TAG_SAMPLEFORMAT: u16 = 339;

// GeoTIFF tags
pub const TAG_MODELPIXELSCALETAG: u16 = 33550;
pub const TAG_MODELTRANSFORMATIONTAG: u16 = 33920;
pub const TAG_MODELTIEPOINTTAG: u16 = 33922;
pub const TAG_GEOKEYDIRECTORYTAG: u16 = 34735;
pub const TAG_GEODOUBLEPARAMSTAG: u16 = 34736;
pub const TAG_GEOASCIIPARAMSTAG: u16 = 34737;
pub const TAG_GDAL_NODATA: u16 = 42113;

// Geokeys
pub const TAG_GTMODELTYPEGEOKEY: u16 = 1024;
pub const TAG_GTRASTERTYPEGEOKEY: u16 = 1025;
pub const TAG_GEOGRAPHICTYPEGEOKEY: u16 = 2048;
pub const TAG_PROJECTEDCSTYPEGEOKEY: u16 = 3072;

// Compression types
pub const COMPRESS_NONE: u16 = 1;
pub const COMPRESS_LZW: u16 = 5;
pub const COMPRESS_DEFLATE: u16 = 8;
pub const COMPRESS_DEFLATE_OLD: u16 = 32946;
pub const COMPRESS_PACKBITS: u16 = 32773;

// Predictors
pub const PREDICTOR_NONE: u16 = 1;
pub const PREDICTOR_HORIZONTAL: u16 = 2;

// Photometric interpretation
pub const PI_WHITEISZERO: u16 = 0;
pub const PI_BLACKISZERO: u16 = 1;

// Sample formats
pub const SF_UNSIGNED: u16 = 1;
pub const SF_SIGNED: u16 = 2;
pub const SF_FLOAT: u16 = 3;

/// Returns the size in bytes of a single value of the given TIFF field type,
/// or `None` for an unrecognized type.
pub fn field_type_size(field_type: u16) -> Option<usize> {
    match field_type {
        DT_BYTE | DT_ASCII | DT_SBYTE | DT_UNDEFINED => Some(1),
        DT_SHORT | DT_SSHORT => Some(2),
        DT_LONG | DT_SLONG | DT_FLOAT | DT_IFD => Some(4),
        DT_RATIONAL | DT_SRATIONAL | DT_DOUBLE => Some(8),
        DT_TIFF_LONG8 | DT_TIFF_SLONG8 | DT_TIFF_IFD8 => Some(8),
        _ => None,
    }
}
