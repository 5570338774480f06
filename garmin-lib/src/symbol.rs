//! Waypoint symbol identifiers.
//!
//! The symbol id is a 16-bit value carried by most waypoint datatypes (D101
//! and later). The table below preserves the numeric-to-name mapping from
//! Garmin's Device Interface Specification, including the group boundaries:
//! marine symbols start at 0, land symbols at 8192 (0x2000), aviation
//! symbols at 16384 (0x4000). Devices accept ids outside this table; those
//! simply have no well-known name.

/// Symbol id for a small white dot, the default for most devices.
pub const SYM_WPT_DOT: u16 = 18;

/// Transparent symbol.
pub const SYM_NULL: u16 = 20;

/// Look up the documented name for a symbol id.
pub fn symbol_name(smbl: u16) -> Option<&'static str> {
    SYMBOLS
        .binary_search_by_key(&smbl, |&(id, _)| id)
        .ok()
        .map(|i| SYMBOLS[i].1)
}

/// Look up the symbol id for a documented name.
pub fn symbol_id(name: &str) -> Option<u16> {
    SYMBOLS.iter().find(|&&(_, n)| n == name).map(|&(id, _)| id)
}

/// Documented symbol ids, sorted by id.
static SYMBOLS: &[(u16, &str)] = &[
    (0, "sym_anchor"), // white anchor symbol
    (1, "sym_bell"), // white bell symbol
    (2, "sym_diamond_grn"), // green diamond symbol
    (3, "sym_diamond_red"), // red diamond symbol
    (4, "sym_dive1"), // diver down flag 1
    (5, "sym_dive2"), // diver down flag 2
    (6, "sym_dollar"), // white dollar symbol
    (7, "sym_fish"), // white fish symbol
    (8, "sym_fuel"), // white fuel symbol
    (9, "sym_horn"), // white horn symbol
    (10, "sym_house"), // white house symbol
    (11, "sym_knife"), // white knife & fork symbol
    (12, "sym_light"), // white light symbol
    (13, "sym_mug"), // white mug symbol
    (14, "sym_skull"), // white skull and crossbones symbol
    (15, "sym_square_grn"), // green square symbol
    (16, "sym_square_red"), // red square symbol
    (17, "sym_wbuoy"), // white buoy waypoint symbol
    (18, "sym_wpt_dot"), // waypoint dot
    (19, "sym_wreck"), // white wreck symbol
    (20, "sym_null"), // null symbol (transparent)
    (21, "sym_mob"), // man overboard symbol
    (22, "sym_buoy_ambr"), // amber map buoy symbol
    (23, "sym_buoy_blck"), // black map buoy symbol
    (24, "sym_buoy_blue"), // blue map buoy symbol
    (25, "sym_buoy_grn"), // green map buoy symbol
    (26, "sym_buoy_grn_red"), // green/red map buoy symbol
    (27, "sym_buoy_grn_wht"), // green/white map buoy symbol
    (28, "sym_buoy_orng"), // orange map buoy symbol
    (29, "sym_buoy_red"), // red map buoy symbol
    (30, "sym_buoy_red_grn"), // red/green map buoy symbol
    (31, "sym_buoy_red_wht"), // red/white map buoy symbol
    (32, "sym_buoy_violet"), // violet map buoy symbol
    (33, "sym_buoy_wht"), // white map buoy symbol
    (34, "sym_buoy_wht_grn"), // white/green map buoy symbol
    (35, "sym_buoy_wht_red"), // white/red map buoy symbol
    (36, "sym_dot"), // white dot symbol
    (37, "sym_rbcn"), // radio beacon symbol
    (150, "sym_boat_ramp"), // boat ramp symbol
    (151, "sym_camp"), // campground symbol
    (152, "sym_restrooms"), // restrooms symbol
    (153, "sym_showers"), // shower symbol
    (154, "sym_drinking_wtr"), // drinking water symbol
    (155, "sym_phone"), // telephone symbol
    (156, "sym_1st_aid"), // first aid symbol
    (157, "sym_info"), // information symbol
    (158, "sym_parking"), // parking symbol
    (159, "sym_park"), // park symbol
    (160, "sym_picnic"), // picnic symbol
    (161, "sym_scenic"), // scenic area symbol
    (162, "sym_skiing"), // skiing symbol
    (163, "sym_swimming"), // swimming symbol
    (164, "sym_dam"), // dam symbol
    (165, "sym_controlled"), // controlled area symbol
    (166, "sym_danger"), // danger symbol
    (167, "sym_restricted"), // restricted area symbol
    (168, "sym_null_2"), // null symbol
    (169, "sym_ball"), // ball symbol
    (170, "sym_car"), // car symbol
    (171, "sym_deer"), // deer symbol
    (172, "sym_shpng_cart"), // shopping cart symbol
    (173, "sym_lodging"), // lodging symbol
    (174, "sym_mine"), // mine symbol
    (175, "sym_trail_head"), // trail head symbol
    (176, "sym_truck_stop"), // truck stop symbol
    (177, "sym_user_exit"), // user exit symbol
    (178, "sym_flag"), // flag symbol
    (179, "sym_circle_x"), // circle with x in the center
    (180, "sym_open_24hr"), // open 24 hours symbol
    (181, "sym_fhs_facility"), // U Fishing Hot Spots™ Facility
    (182, "sym_bot_cond"), // bottom conditions
    (183, "sym_tide_pred_stn"), // tide/current prediction station
    (184, "sym_anchor_prohib"), // U anchor prohibited symbol
    (185, "sym_beacon"), // U beacon symbol
    (186, "sym_coast_guard"), // U coast guard symbol
    (187, "sym_reef"), // U reef symbol
    (188, "sym_weedbed"), // U weedbed symbol
    (189, "sym_dropoff"), // U dropoff symbol
    (190, "sym_dock"), // U dock symbol
    (191, "sym_marina"), // U marina symbol
    (192, "sym_bait_tackle"), // U bait and tackle symbol
    (193, "sym_stump"), // U stump symbol
    (194, "sym_dsc_posn"), // DSC position report symbol
    (195, "sym_dsc_distress"), // DSC distress call symbol
    (196, "sym_wbuoy_dark"), // dark buoy waypoint symbol
    (197, "sym_exp_wreck"), // exposed wreck symbol
    (198, "sym_rcmmd_anchor"), // recommended anchor symbol
    (199, "sym_brush_pile"), // brush pile symbol
    (200, "sym_caution"), // caution symbol
    (201, "sym_fish_1"), // fish symbol 1
    (202, "sym_fish_2"), // fish symbol 2
    (203, "sym_fish_3"), // fish symbol 3
    (204, "sym_fish_4"), // fish symbol 4
    (205, "sym_fish_5"), // fish symbol 5
    (206, "sym_fish_6"), // fish symbol 6
    (207, "sym_fish_7"), // fish symbol 7
    (208, "sym_fish_8"), // fish symbol 8
    (209, "sym_fish_9"), // fish symbol 9
    (210, "sym_fish_attract"), // fish attractor
    (211, "sym_hump"), // hump symbol
    (212, "sym_laydown"), // laydown symbol
    (213, "sym_ledge"), // ledge symbol
    (214, "sym_lilly_pads"), // lilly pads symbol
    (215, "sym_no_wake_zone"), // no wake zone symbol
    (216, "sym_rocks"), // rocks symbol
    (217, "sym_stop"), // stop symbol
    (218, "sym_undrwtr_grss"), // underwater grass symbol
    (219, "sym_undrwtr_tree"), // underwater tree symbol
    (220, "sym_pin_yllw"), // yellow pin symbol
    (221, "sym_flag_yllw"), // yellow flag symbol
    (222, "sym_diamond_yllw"), // yellow diamond symbol
    (223, "sym_cricle_yllw"), // yellow circle symbol
    (224, "sym_square_yllw"), // yellow square symbol
    (225, "sym_triangle_yllw"), // yellow triangle symbol
    (7680, "sym_begin_custom"), // first user customizable symbol
    (8191, "sym_end_custom"), // last user customizable symbol
    (8192, "sym_is_hwy"), // interstate hwy symbol
    (8193, "sym_us_hwy"), // us hwy symbol
    (8194, "sym_st_hwy"), // state hwy symbol
    (8195, "sym_mi_mrkr"), // mile marker symbol
    (8196, "sym_trcbck"), // TracBack (feet) symbol
    (8197, "sym_golf"), // golf symbol
    (8198, "sym_sml_cty"), // small city symbol
    (8199, "sym_med_cty"), // medium city symbol
    (8200, "sym_lrg_cty"), // large city symbol
    (8201, "sym_freeway"), // intl freeway hwy symbol
    (8202, "sym_ntl_hwy"), // intl national hwy symbol
    (8203, "sym_cap_cty"), // capitol city symbol (star)
    (8204, "sym_amuse_pk"), // amusement park symbol
    (8205, "sym_bowling"), // bowling symbol
    (8206, "sym_car_rental"), // car rental symbol
    (8207, "sym_car_repair"), // car repair symbol
    (8208, "sym_fastfood"), // fast food symbol
    (8209, "sym_fitness"), // fitness symbol
    (8210, "sym_movie"), // movie symbol
    (8211, "sym_museum"), // museum symbol
    (8212, "sym_pharmacy"), // pharmacy symbol
    (8213, "sym_pizza"), // pizza symbol
    (8214, "sym_post_ofc"), // post office symbol
    (8215, "sym_rv_park"), // RV park symbol
    (8216, "sym_school"), // school symbol
    (8217, "sym_stadium"), // stadium symbol
    (8218, "sym_store"), // dept. store symbol
    (8219, "sym_zoo"), // zoo symbol
    (8220, "sym_gas_plus"), // convenience store symbol
    (8221, "sym_faces"), // live theater symbol
    (8222, "sym_ramp_int"), // ramp intersection symbol
    (8223, "sym_st_int"), // street intersection symbol
    (8226, "sym_weigh_sttn"), // inspection/weigh station symbol
    (8227, "sym_toll_booth"), // toll booth symbol
    (8228, "sym_elev_pt"), // elevation point symbol
    (8229, "sym_ex_no_srvc"), // exit without services symbol
    (8230, "sym_geo_place_mm"), // geographic place name, man-made
    (8231, "sym_geo_place_wtr"), // geographic place name, water
    (8232, "sym_geo_place_lnd"), // geographic place name, land
    (8233, "sym_bridge"), // bridge symbol
    (8234, "sym_building"), // building symbol
    (8235, "sym_cemetery"), // cemetery symbol
    (8236, "sym_church"), // church symbol
    (8237, "sym_civil"), // civil location symbol
    (8238, "sym_crossing"), // crossing symbol
    (8239, "sym_hist_town"), // historical town symbol
    (8240, "sym_levee"), // levee symbol
    (8241, "sym_military"), // military location symbol
    (8242, "sym_oil_field"), // oil field symbol
    (8243, "sym_tunnel"), // tunnel symbol
    (8244, "sym_beach"), // beach symbol
    (8245, "sym_forest"), // forest symbol
    (8246, "sym_summit"), // summit symbol
    (8247, "sym_lrg_ramp_int"), // large ramp intersection symbol
    (8249, "sym_badge"), // police/official badge symbol
    (8250, "sym_cards"), // gambling/casino symbol
    (8251, "sym_snowski"), // snow skiing symbol
    (8252, "sym_iceskate"), // ice skating symbol
    (8253, "sym_wrecker"), // tow truck (wrecker) symbol
    (8254, "sym_border"), // border crossing (port of entry)
    (8255, "sym_geocache"), // geocache location
    (8256, "sym_geocache_fnd"), // found geocache
    (8257, "sym_cntct_smiley"), // Rino contact symbol, "smiley"
    (8258, "sym_cntct_ball_cap"), // Rino contact symbol, "ball cap"
    (8259, "sym_cntct_big_ears"), // Rino contact symbol, "big ear"
    (8260, "sym_cntct_spike"), // Rino contact symbol, "spike"
    (8261, "sym_cntct_goatee"), // Rino contact symbol, "goatee"
    (8262, "sym_cntct_afro"), // Rino contact symbol, "afro"
    (8263, "sym_cntct_dreads"), // Rino contact symbol, "dreads"
    (8264, "sym_cntct_female1"), // Rino contact symbol, "female 1"
    (8265, "sym_cntct_female2"), // Rino contact symbol, "female 2"
    (8266, "sym_cntct_female3"), // Rino contact symbol, "female 3"
    (8267, "sym_cntct_ranger"), // Rino contact symbol, "ranger"
    (8268, "sym_cntct_kung_fu"), // Rino contact symbol, "kung fu"
    (8269, "sym_cntct_sumo"), // Rino contact symbol, "sumo"
    (8270, "sym_cntct_pirate"), // Rino contact symbol, "pirate"
    (8271, "sym_cntct_biker"), // Rino contact symbol, "biker"
    (8272, "sym_cntct_alien"), // Rino contact symbol, "alien"
    (8273, "sym_cntct_bug"), // Rino contact symbol, "bug"
    (8274, "sym_cntct_cat"), // Rino contact symbol, "cat"
    (8275, "sym_cntct_dog"), // Rino contact symbol, "dog"
    (8276, "sym_cntct_pig"), // Rino contact symbol, "pig"
    (8277, "sym_cntct_blond_woman"), // contact symbol - blond woman
    (8278, "sym_cntct_clown"), // contact symbol - clown
    (8279, "sym_cntct_glasses_boy"), // contact symbol - glasses boy
    (8280, "sym_cntct_panda"), // contact symbol - panda
    (8281, "sym_cntct_reserved5"), // contact symbol -
    (8282, "sym_hydrant"), // water hydrant symbol
    (8283, "sym_voice_rec"), // icon for a voice recording
    (8284, "sym_flag_blue"), // blue flag symbol
    (8285, "sym_flag_green"), // green flag symbol
    (8286, "sym_flag_red"), // red flag symbol
    (8287, "sym_pin_blue"), // blue pin symbol
    (8288, "sym_pin_green"), // green pin symbol
    (8289, "sym_pin_red"), // red pin symbol
    (8290, "sym_block_blue"), // blue block symbol
    (8291, "sym_block_green"), // green block symbol
    (8292, "sym_block_red"), // red block symbol
    (8293, "sym_bike_trail"), // bike trail symbol
    (8294, "sym_circle_red"), // red circle symbol
    (8295, "sym_circle_green"), // green circle symbol
    (8296, "sym_circle_blue"), // blue circle symbol
    (8299, "sym_diamond_blue"), // blue diamond symbol
    (8300, "sym_oval_red"), // red oval symbol
    (8301, "sym_oval_green"), // green oval symbol
    (8302, "sym_oval_blue"), // blue oval symbol
    (8303, "sym_rect_red"), // red rectangle symbol
    (8304, "sym_rect_green"), // green rectangle symbol
    (8305, "sym_rect_blue"), // blue rectangle symbol
    (8308, "sym_square_blue"), // blue square symbol
    (8309, "sym_letter_a_red"), // red letter 'A' symbol
    (8310, "sym_letter_b_red"), // red letter 'B' symbol
    (8311, "sym_letter_c_red"), // red letter 'C' symbol
    (8312, "sym_letter_d_red"), // red letter 'D' symbol
    (8313, "sym_letter_a_green"), // green letter 'A' symbol
    (8314, "sym_letter_b_green"), // green letter 'B' symbol
    (8315, "sym_letter_c_green"), // green letter 'C' symbol
    (8316, "sym_letter_d_green"), // green letter 'D' symbol
    (8317, "sym_letter_a_blue"), // blue letter 'A' symbol
    (8318, "sym_letter_b_blue"), // blue letter 'B' symbol
    (8319, "sym_letter_c_blue"), // blue letter 'C' symbol
    (8320, "sym_letter_d_blue"), // blue letter 'D' symbol
    (8321, "sym_number_0_red"), // red number '0' symbol
    (8322, "sym_number_1_red"), // red number '1' symbol
    (8323, "sym_number_2_red"), // red number '2' symbol
    (8324, "sym_number_3_red"), // red number '3' symbol
    (8325, "sym_number_4_red"), // red number '4' symbol
    (8326, "sym_number_5_red"), // red number '5' symbol
    (8327, "sym_number_6_red"), // red number '6' symbol
    (8328, "sym_number_7_red"), // red number '7' symbol
    (8329, "sym_number_8_red"), // red number '8' symbol
    (8330, "sym_number_9_red"), // red number '9' symbol
    (8331, "sym_number_0_green"), // green number '0' symbol
    (8332, "sym_number_1_green"), // green number '1' symbol
    (8333, "sym_number_2_green"), // green number '2' symbol
    (8334, "sym_number_3_green"), // green number '3' symbol
    (8335, "sym_number_4_green"), // green number '4' symbol
    (8336, "sym_number_5_green"), // green number '5' symbol
    (8337, "sym_number_6_green"), // green number '6' symbol
    (8338, "sym_number_7_green"), // green number '7' symbol
    (8339, "sym_number_8_green"), // green number '8' symbol
    (8340, "sym_number_9_green"), // green number '9' symbol
    (8341, "sym_number_0_blue"), // blue number '0' symbol
    (8342, "sym_number_1_blue"), // blue number '1' symbol
    (8343, "sym_number_2_blue"), // blue number '2' symbol
    (8344, "sym_number_3_blue"), // blue number '3' symbol
    (8345, "sym_number_4_blue"), // blue number '4' symbol
    (8346, "sym_number_5_blue"), // blue number '5' symbol
    (8347, "sym_number_6_blue"), // blue number '6' symbol
    (8348, "sym_number_7_blue"), // blue number '7' symbol
    (8349, "sym_number_8_blue"), // blue number '8' symbol
    (8350, "sym_number_9_blue"), // blue number '9' symbol
    (8351, "sym_triangle_blue"), // blue triangle symbol
    (8352, "sym_triangle_green"), // green triangle symbol
    (8353, "sym_triangle_red"), // red triangle symbol
    (8354, "sym_library"), // library (book)
    (8355, "sym_bus"), // ground transportation
    (8356, "sym_city_hall"), // city hall
    (8357, "sym_wine"), // winery
    (8358, "sym_oem_dealer"), // OEM dealer
    (8359, "sym_food_asian"), // asian food symbol
    (8360, "sym_food_deli"), // deli symbol
    (8361, "sym_food_italian"), // italian food symbol
    (8362, "sym_food_seafood"), // seafood symbol
    (8363, "sym_food_steak"), // steak symbol
    (8364, "sym_atv"), // ATV
    (8365, "sym_big_game"), // big game
    (8366, "sym_blind"), // blind
    (8367, "sym_blood_trail"), // blood trail
    (8368, "sym_cover"), // cover
    (8369, "sym_covey"), // covey
    (8370, "sym_food_source"), // food source
    (8371, "sym_furbearer"), // furbearer
    (8372, "sym_lodge"), // lodge
    (8373, "sym_small_game"), // small game
    (8374, "sym_tracks"), // tracks
    (8375, "sym_treed_quarry"), // treed quarry
    (8376, "sym_tree_stand"), // tree stand
    (8377, "sym_truck"), // truck
    (8378, "sym_upland_game"), // upland game
    (8379, "sym_waterfowl"), // waterfowl
    (8380, "sym_water_source"), // water source
    (8381, "sym_tracker_auto_dark_blue"), // tracker - vehicles
    (8382, "sym_tracker_auto_green"),
    (8383, "sym_tracker_auto_light_blue"),
    (8384, "sym_tracker_auto_light_purple"),
    (8385, "sym_tracker_auto_lime"),
    (8386, "sym_tracker_auto_normal"),
    (8387, "sym_tracker_auto_orange"),
    (8388, "sym_tracker_auto_purple"),
    (8389, "sym_tracker_auto_red"),
    (8390, "sym_tracker_auto_sky_blue"),
    (8391, "sym_tracker_auto_yellow"),
    (8392, "sym_tracker_gnrc_dark_blue"), // tracker - generic
    (8393, "sym_tracker_gnrc_green"),
    (8394, "sym_tracker_gnrc_light_blue"),
    (8395, "sym_tracker_gnrc_light_purple"),
    (8396, "sym_tracker_gnrc_lime"),
    (8397, "sym_tracker_gnrc_normal"),
    (8398, "sym_tracker_gnrc_orange"),
    (8399, "sym_tracker_gnrc_purple"),
    (8400, "sym_tracker_gnrc_red"),
    (8401, "sym_tracker_gnrc_sky_blue"),
    (8402, "sym_tracker_gnrc_yellow"),
    (8403, "sym_tracker_pdstrn_dark_blue"), // tracker - pedestrians
    (8404, "sym_tracker_pdstrn_green"),
    (8405, "sym_tracker_pdstrn_light_blue"),
    (8406, "sym_tracker_pdstrn_light_purple"),
    (8407, "sym_tracker_pdstrn_lime"),
    (8408, "sym_tracker_pdstrn_normal"),
    (8409, "sym_tracker_pdstrn_orange"),
    (8410, "sym_tracker_pdstrn_purple"),
    (8411, "sym_tracker_pdstrn_red"),
    (8412, "sym_tracker_pdstrn_sky_blue"),
    (8413, "sym_tracker_pdstrn_yellow"),
    (8414, "sym_tracker_auto_dsbl_dark_blue"), // tracker - vehicles
    (8415, "sym_tracker_auto_dsbl_green"),
    (8416, "sym_tracker_auto_dsbl_light_blue"),
    (8417, "sym_tracker_auto_dsbl_light_purple"),
    (8418, "sym_tracker_auto_dsbl_lime"),
    (8419, "sym_tracker_auto_dsbl_normal"),
    (8420, "sym_tracker_auto_dsbl_orange"),
    (8421, "sym_tracker_auto_dsbl_purple"),
    (8422, "sym_tracker_auto_dsbl_red"),
    (8423, "sym_tracker_auto_dsbl_sky_blue"),
    (8424, "sym_tracker_auto_dsbl_yellow"),
    (8425, "sym_tracker_gnrc_dsbl_dark_blue"), // tracker - generic
    (8426, "sym_tracker_gnrc_dsbl_green"),
    (8427, "sym_tracker_gnrc_dsbl_light_blue"),
    (8428, "sym_tracker_gnrc_dsbl_light_purple"),
    (8429, "sym_tracker_gnrc_dsbl_lime"),
    (8430, "sym_tracker_gnrc_dsbl_normal"),
    (8431, "sym_tracker_gnrc_dsbl_orange"),
    (8432, "sym_tracker_gnrc_dsbl_purple"),
    (8433, "sym_tracker_gnrc_dsbl_red"),
    (8434, "sym_tracker_gnrc_dsbl_sky_blue"),
    (8435, "sym_tracker_gnrc_dsbl_yellow"),
    (8436, "sym_tracker_pdstrn_dsbl_dark_blue"), // tracker – pedestrians
    (8437, "sym_tracker_pdstrn_dsbl_green"),
    (8438, "sym_tracker_pdstrn_dsbl_light_blue"),
    (8439, "sym_tracker_pdstrn_dsbl_light_purple"),
    (8440, "sym_tracker_pdstrn_dsbl_lime"),
    (8441, "sym_tracker_pdstrn_dsbl_normal"),
    (8442, "sym_tracker_pdstrn_dsbl_orange"),
    (8443, "sym_tracker_pdstrn_dsbl_purple"),
    (8444, "sym_tracker_pdstrn_dsbl_red"),
    (8445, "sym_tracker_pdstrn_dsbl_sky_blue"),
    (8446, "sym_tracker_pdstrn_dsbl_yellow"),
    (8447, "sym_sm_red_circle"), // small red circle
    (8448, "sym_sm_yllw_circle"), // small yellow circle
    (8449, "sym_sm_green_circle"), // small green circle
    (8450, "sym_sm_blue_circle"), // small blue circle
    (8451, "sym_alert"), // red alert (! point)
    (8452, "sym_snow_mobile"), // snow mobile
    (8453, "sym_wind_turbine"), // wind turbine
    (8454, "sym_camp_fire"), // camp fire
    (8455, "sym_binoculars"), // binoculars
    (8456, "sym_kayak"), // kayak
    (8457, "sym_canoe"), // canoe
    (8458, "sym_shelter"), // lean to
    (8459, "sym_xski"), // cross country skiing
    (8460, "sym_hunting"), // hunting
    (8461, "sym_horse_tracks"), // horse trail
    (8462, "sym_tree"), // deciduous tree
    (8463, "sym_lighthouse"), // lighthouse
    (8464, "sym_creek_crossing"), // creek crossing
    (8465, "sym_deer_sign_scrape"), // deer sign (scrape)
    (8466, "sym_deer_sign_rub"), // deer sign (rub)
    (8467, "sym_elk"), // elk
    (8468, "sym_elk_wallow"), // elk wallow
    (8469, "sym_shed_antlers"), // shed (antlers)
    (8470, "sym_turkey"), // turkey
    (16384, "sym_airport"), // airport symbol
    (16385, "sym_int"), // intersection symbol
    (16386, "sym_ndb"), // non-directional beacon symbol
    (16387, "sym_vor"), // VHF omni-range symbol
    (16388, "sym_heliport"), // heliport symbol
    (16389, "sym_private"), // private field symbol
    (16390, "sym_soft_fld"), // soft field symbol
    (16391, "sym_tall_tower"), // tall tower symbol
    (16392, "sym_short_tower"), // short tower symbol
    (16393, "sym_glider"), // glider symbol
    (16394, "sym_ultralight"), // ultralight symbol
    (16395, "sym_parachute"), // parachute symbol
    (16396, "sym_vortac"), // VOR/TACAN symbol
    (16397, "sym_vordme"), // VOR-DME symbol
    (16398, "sym_faf"), // first approach fix
    (16399, "sym_lom"), // localizer outer marker
    (16400, "sym_map"), // missed approach point
    (16401, "sym_tacan"), // TACAN symbol
    (16402, "sym_seaplane"), // seaplane base
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols_resolve() {
        assert_eq!(symbol_name(0), Some("sym_anchor"));
        assert_eq!(symbol_name(18), Some("sym_wpt_dot"));
        assert_eq!(symbol_name(8192), Some("sym_is_hwy"));
        assert_eq!(symbol_name(16384), Some("sym_airport"));
    }

    #[test]
    fn unknown_symbol_is_none() {
        assert_eq!(symbol_name(12345), None);
        assert_eq!(symbol_name(u16::MAX), None);
    }

    #[test]
    fn name_lookup_inverts_id_lookup() {
        assert_eq!(symbol_id("sym_anchor"), Some(0));
        assert_eq!(symbol_id("sym_no_such_symbol"), None);
    }

    #[test]
    fn table_is_sorted_for_binary_search() {
        assert!(SYMBOLS.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
