//! Animation event catalog.
//!
//! Codes below 1000 are the string-named events of eventlist.h, 1000s are
//! scripted events (scriptevent.h), 2000s shared NPC events, 3000 to 4999
//! weapon events and 5000 up client events (cl_animevent.h).

use std::sync::OnceLock;

use ahash::AHashMap;
use flagset::{flags, FlagSet};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

flags! {
    /// Which side of the game handles an event.
    pub enum AnimEventType: u8 {
        Server = 1 << 0,
        Scripted = 1 << 1,
        Shared = 1 << 2,
        Weapon = 1 << 3,
        Client = 1 << 4,
        FacePoser = 1 << 5,
    }
}

macro_rules! anim_events {
    ($($name:ident = $code:literal => $first:ident $(| $rest:ident)*,)*) => {
        #[allow(non_camel_case_types)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
        #[repr(i32)]
        pub enum AnimEvent {
            $($name = $code,)*
        }

        impl AnimEvent {
            pub const ALL: &'static [AnimEvent] = &[$(AnimEvent::$name,)*];

            /// The name used for this event in QC files and new-style models.
            pub fn name(self) -> &'static str {
                match self {
                    $(AnimEvent::$name => stringify!($name),)*
                }
            }

            pub fn types(self) -> FlagSet<AnimEventType> {
                match self {
                    $(AnimEvent::$name => FlagSet::from(AnimEventType::$first) $(| AnimEventType::$rest)*,)*
                }
            }
        }
    };
}

anim_events! {
    // New string-based type
    AE_EMPTY = 0 => Server | Scripted | Client,
    AE_NPC_LEFTFOOT = 1 => Server,
    AE_NPC_RIGHTFOOT = 2 => Server,
    AE_NPC_BODYDROP_LIGHT = 3 => Server,
    AE_NPC_BODYDROP_HEAVY = 4 => Server,
    AE_NPC_SWISHSOUND = 5 => Server,
    AE_NPC_180TURN = 6 => Server,
    AE_NPC_ITEM_PICKUP = 7 => Server,
    AE_NPC_WEAPON_DROP = 8 => Server,
    AE_NPC_WEAPON_SET_SEQUENCE_NAME = 9 => Server,
    AE_NPC_WEAPON_SET_SEQUENCE_NUMBER = 10 => Server,
    AE_NPC_WEAPON_SET_ACTIVITY = 11 => Server,
    AE_NPC_DRAW = 12 => Server,
    AE_NPC_WEAPON_FIRE = 13 => Server | Weapon,

    AE_CL_PLAYSOUND = 14 => Client,
    AE_SV_PLAYSOUND = 15 => Server,
    AE_CL_STOPSOUND = 16 => Client,

    AE_START_SCRIPTED_EFFECT = 17 => Server,
    AE_STOP_SCRIPTED_EFFECT = 18 => Server,

    AE_CLIENT_EFFECT_ATTACH = 19 => Client,

    AE_MUZZLEFLASH = 20 => Client,
    AE_NPC_MUZZLEFLASH = 21 => Client,

    AE_THUMPER_THUMP = 22 => Server,
    AE_AMMOCRATE_PICKUP_AMMO = 23 => Server,

    AE_NPC_RAGDOLL = 24 => Server,
    AE_NPC_ADDGESTURE = 25 => Server,
    AE_NPC_RESTARTGESTURE = 26 => Server,
    AE_NPC_ATTACK_BROADCAST = 27 => Server,
    AE_NPC_HURT_INTERACTION_PARTNER = 28 => Server,
    AE_NPC_SET_INTERACTION_CANTDIE = 29 => Server,

    AE_SV_DUSTTRAIL = 30 => Server,
    AE_CL_CREATE_PARTICLE_EFFECT = 31 => Client,
    AE_RAGDOLL = 32 => Server,

    AE_CL_ENABLE_BODYGROUP = 33 => Client,
    AE_CL_DISABLE_BODYGROUP = 34 => Client,
    AE_CL_BODYGROUP_SET_VALUE = 35 => Client,
    AE_CL_BODYGROUP_SET_VALUE_CMODEL_WPN = 36 => Client,

    AE_WPN_PRIMARYATTACK = 37 => Client | Server,
    AE_WPN_INCREMENTAMMO = 38 => Client | Server,
    AE_WPN_HIDE = 39 => Client | Server,
    AE_WPN_UNHIDE = 40 => Client | Server,
    AE_WPN_PLAYWPNSOUND = 41 => Client | Server,

    AE_RD_ROBOT_POP_PANELS_OFF = 42 => Client,

    AE_TAUNT_ENABLE_MOVE = 43 => Client,
    AE_TAUNT_DISABLE_MOVE = 44 => Client,

    // Alien Swarm+ events
    AE_ASW_FOOTSTEP = 45 => Client,
    AE_MARINE_FOOTSTEP = 46 => Client,
    AE_MARINE_RELOAD_SOUND_A = 47 => Client,
    AE_MARINE_RELOAD_SOUND_B = 48 => Client,
    AE_MARINE_RELOAD_SOUND_C = 49 => Client,
    AE_REMOVE_CLIENT_AIM = 50 => Client,

    AE_MELEE_DAMAGE = 51 => Server,
    AE_MELEE_START_COLLISION_DAMAGE = 52 => Server,
    AE_MELEE_STOP_COLLISION_DAMAGE = 53 => Server,
    AE_SCREEN_SHAKE = 54 => Server,
    AE_START_DETECTING_COMBO = 55 => Server,
    AE_STOP_DETECTING_COMBO = 56 => Server,
    AE_COMBO_TRANSITION = 57 => Server,
    AE_SKILL_EVENT = 59 => Server,

    AE_TUG_INCAP = 60 => Server,

    // Script events
    SCRIPT_EVENT_DEAD = 1000 => Scripted,
    SCRIPT_EVENT_NOINTERRUPT = 1001 => Scripted,
    SCRIPT_EVENT_CANINTERRUPT = 1002 => Scripted,
    SCRIPT_EVENT_FIREEVENT = 1003 => Scripted,
    SCRIPT_EVENT_SOUND = 1004 => Scripted,
    SCRIPT_EVENT_SENTENCE = 1005 => Scripted,
    SCRIPT_EVENT_INAIR = 1006 => Scripted,
    SCRIPT_EVENT_ENDANIMATION = 1007 => Scripted,
    SCRIPT_EVENT_SOUND_VOICE = 1008 => Scripted,
    SCRIPT_EVENT_SENTENCE_RND1 = 1009 => Scripted,
    SCRIPT_EVENT_NOT_DEAD = 1010 => Scripted,
    SCRIPT_EVENT_EMPHASIS = 1011 => Scripted | FacePoser,
    SCRIPT_EVENT_BODYGROUPON = 1020 => Scripted,
    SCRIPT_EVENT_BODYGROUPOFF = 1021 => Scripted,
    SCRIPT_EVENT_BODYGROUPTEMP = 1022 => Scripted,
    SCRIPT_EVENT_FIRE_INPUT = 1100 => Scripted,

    NPC_EVENT_BODYDROP_LIGHT = 2001 => Shared | Server,
    NPC_EVENT_BODYDROP_HEAVY = 2002 => Shared | Server,

    NPC_EVENT_SWISHSOUND = 2010 => Shared | Server,

    NPC_EVENT_180TURN = 2020 => Shared | Server,

    NPC_EVENT_ITEM_PICKUP = 2040 => Shared | Server,
    NPC_EVENT_WEAPON_DROP = 2041 => Shared | Server,
    NPC_EVENT_WEAPON_SET_SEQUENCE_NAME = 2042 => Shared | Server,
    NPC_EVENT_WEAPON_SET_SEQUENCE_NUMBER = 2043 => Shared | Server,
    NPC_EVENT_WEAPON_SET_ACTIVITY = 2044 => Shared | Server,

    NPC_EVENT_LEFTFOOT = 2050 => Shared | Server,
    NPC_EVENT_RIGHTFOOT = 2051 => Shared | Server,

    NPC_EVENT_OPEN_DOOR = 2060 => Shared | Server,

    EVENT_WEAPON_MELEE_HIT = 3001 => Weapon,
    EVENT_WEAPON_SMG1 = 3002 => Weapon,
    EVENT_WEAPON_MELEE_SWISH = 3003 => Weapon,
    EVENT_WEAPON_SHOTGUN_FIRE = 3004 => Weapon,
    EVENT_WEAPON_THROW = 3005 => Weapon,
    EVENT_WEAPON_AR1 = 3006 => Weapon,
    EVENT_WEAPON_AR2 = 3007 => Weapon,
    EVENT_WEAPON_HMG1 = 3008 => Weapon,
    EVENT_WEAPON_SMG2 = 3009 => Weapon,
    EVENT_WEAPON_MISSILE_FIRE = 3010 => Weapon,
    EVENT_WEAPON_SNIPER_RIFLE_FIRE = 3011 => Weapon,
    EVENT_WEAPON_AR2_GRENADE = 3012 => Weapon,
    EVENT_WEAPON_THROW2 = 3013 => Weapon,
    EVENT_WEAPON_PISTOL_FIRE = 3014 => Weapon,
    EVENT_WEAPON_RELOAD = 3015 => Weapon,
    EVENT_WEAPON_THROW3 = 3016 => Weapon,
    EVENT_WEAPON_RELOAD_SOUND = 3017 => Weapon,
    EVENT_WEAPON_RELOAD_FILL_CLIP = 3018 => Weapon,
    EVENT_WEAPON_SMG1_BURST1 = 3101 => Weapon,
    EVENT_WEAPON_SMG1_BURSTN = 3102 => Weapon,
    EVENT_WEAPON_AR2_ALTFIRE = 3103 => Weapon,

    EVENT_WEAPON_SEQUENCE_FINISHED = 3900 => Weapon,

    // CS:GO foot impacts, options name the IK foot.
    CSGO_FOOT_JUMP = 4001 => Client,
    CSGO_FOOT_WALK = 4002 => Client,

    // Client-side events
    CL_EVENT_MUZZLEFLASH0 = 5001 => Client,
    CL_EVENT_MUZZLEFLASH1 = 5011 => Client,
    CL_EVENT_MUZZLEFLASH2 = 5021 => Client,
    CL_EVENT_MUZZLEFLASH3 = 5031 => Client,
    CL_EVENT_SPARK0 = 5002 => Client,
    CL_EVENT_NPC_MUZZLEFLASH0 = 5003 => Client,
    CL_EVENT_NPC_MUZZLEFLASH1 = 5013 => Client,
    CL_EVENT_NPC_MUZZLEFLASH2 = 5023 => Client,
    CL_EVENT_NPC_MUZZLEFLASH3 = 5033 => Client,
    CL_EVENT_SOUND = 5004 => Client,
    CL_EVENT_EJECTBRASS1 = 6001 => Client,
    CL_EVENT_DISPATCHEFFECT0 = 9001 => Client,
    CL_EVENT_DISPATCHEFFECT1 = 9011 => Client,
    CL_EVENT_DISPATCHEFFECT2 = 9021 => Client,
    CL_EVENT_DISPATCHEFFECT3 = 9031 => Client,
    CL_EVENT_DISPATCHEFFECT4 = 9041 => Client,
    CL_EVENT_DISPATCHEFFECT5 = 9051 => Client,
    CL_EVENT_DISPATCHEFFECT6 = 9061 => Client,
    CL_EVENT_DISPATCHEFFECT7 = 9071 => Client,
    CL_EVENT_DISPATCHEFFECT8 = 9081 => Client,
    CL_EVENT_DISPATCHEFFECT9 = 9091 => Client,
    CL_EVENT_SPRITEGROUP_CREATE = 6002 => Client,
    CL_EVENT_SPRITEGROUP_DESTROY = 6003 => Client,
    CL_EVENT_FOOTSTEP_LEFT = 6004 => Client,
    CL_EVENT_FOOTSTEP_RIGHT = 6005 => Client,
    CL_EVENT_MFOOTSTEP_LEFT = 6006 => Client,
    CL_EVENT_MFOOTSTEP_RIGHT = 6007 => Client,
    CL_EVENT_MFOOTSTEP_LEFT_LOUD = 6008 => Client,
    CL_EVENT_MFOOTSTEP_RIGHT_LOUD = 6009 => Client,

    // Counter-Strike: Source player events, only ever used as bare numbers.
    CSS_FOOT_WATER_SPLASH = 7001 => Client,
    CSS_FOOT_WATER_RIPPLE = 7002 => Client,
}

/// Second names for codes that already have an event above.
const ALIASES: &[(&str, AnimEvent)] = &[
    ("AE_NPC_HOLSTER", AnimEvent::AE_NPC_WEAPON_SET_ACTIVITY),
    ("AE_ALLOW_MOVEMENT", AnimEvent::AE_COMBO_TRANSITION),
];

/// Events that play the soundscript named in their options.
pub const SOUND_EVENTS: &[AnimEvent] = &[
    AnimEvent::AE_CL_PLAYSOUND,
    AnimEvent::AE_SV_PLAYSOUND,
    AnimEvent::SCRIPT_EVENT_SOUND,
    AnimEvent::SCRIPT_EVENT_SOUND_VOICE,
];

/// Events that play NPC footstep sounds, with the NPC name in their options.
pub const FOOTSTEP_EVENTS: &[AnimEvent] = &[AnimEvent::AE_NPC_LEFTFOOT, AnimEvent::AE_NPC_RIGHTFOOT];

fn by_name() -> &'static AHashMap<&'static str, AnimEvent> {
    static TABLE: OnceLock<AHashMap<&'static str, AnimEvent>> = OnceLock::new();
    TABLE.get_or_init(|| {
        AnimEvent::ALL
            .iter()
            .filter(|event| event.has_official_name())
            .map(|&event| (event.name(), event))
            .chain(ALIASES.iter().copied())
            .collect()
    })
}

impl AnimEvent {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        <Self as FromPrimitive>::from_i32(code)
    }

    /// Look up an event by its QC name. Case sensitive, like the engine.
    pub fn from_name(name: &str) -> Option<Self> {
        by_name().get(name).copied()
    }

    /// A few events only exist as bare numbers and can't be referred to by name.
    pub fn has_official_name(self) -> bool {
        !matches!(
            self,
            AnimEvent::CSGO_FOOT_JUMP
                | AnimEvent::CSGO_FOOT_WALK
                | AnimEvent::CSS_FOOT_WATER_SPLASH
                | AnimEvent::CSS_FOOT_WATER_RIPPLE
        )
    }

    pub fn is_sound(self) -> bool {
        SOUND_EVENTS.contains(&self)
    }

    pub fn is_footstep(self) -> bool {
        FOOTSTEP_EVENTS.contains(&self)
    }
}

#[cfg(test)]
mod events_tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<i32> = AnimEvent::ALL.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), AnimEvent::ALL.len());
    }

    #[test]
    fn every_event_round_trips_by_code() {
        for &event in AnimEvent::ALL {
            assert_eq!(AnimEvent::from_code(event.code()), Some(event));
        }
        assert_eq!(AnimEvent::from_code(58), None);
        assert_eq!(AnimEvent::from_code(12345), None);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(
            AnimEvent::from_name("AE_NPC_LEFTFOOT"),
            Some(AnimEvent::AE_NPC_LEFTFOOT)
        );
        assert_eq!(
            AnimEvent::from_name("SCRIPT_EVENT_SOUND"),
            Some(AnimEvent::SCRIPT_EVENT_SOUND)
        );
        assert_eq!(AnimEvent::from_name("ae_npc_leftfoot"), None);
        assert_eq!(AnimEvent::from_name("AE_ANTLION_BURROW_IN"), None);
    }

    #[test]
    fn aliases_share_a_code() {
        assert_eq!(
            AnimEvent::from_name("AE_NPC_HOLSTER"),
            Some(AnimEvent::AE_NPC_WEAPON_SET_ACTIVITY)
        );
        assert_eq!(AnimEvent::from_name("AE_ALLOW_MOVEMENT").map(AnimEvent::code), Some(57));
        // By code the first name is canonical.
        assert_eq!(AnimEvent::from_code(11).map(AnimEvent::name), Some("AE_NPC_WEAPON_SET_ACTIVITY"));
    }

    #[test]
    fn unnamed_events_only_by_code() {
        assert_eq!(AnimEvent::from_name("CSGO_FOOT_WALK"), None);
        assert_eq!(AnimEvent::from_code(4002), Some(AnimEvent::CSGO_FOOT_WALK));
        assert_eq!(AnimEvent::from_name("CSS_FOOT_WATER_SPLASH"), None);
    }

    #[test]
    fn categories() {
        assert!(AnimEvent::AE_CL_PLAYSOUND.types().contains(AnimEventType::Client));
        assert!(!AnimEvent::AE_CL_PLAYSOUND.types().contains(AnimEventType::Server));
        assert!(AnimEvent::SCRIPT_EVENT_SOUND.types().contains(AnimEventType::Scripted));
        assert!(AnimEvent::EVENT_WEAPON_PISTOL_FIRE.types().contains(AnimEventType::Weapon));
        assert_eq!(
            AnimEvent::AE_WPN_PRIMARYATTACK.types(),
            AnimEventType::Client | AnimEventType::Server
        );
    }

    #[test]
    fn sound_and_footstep_sets() {
        assert!(AnimEvent::AE_SV_PLAYSOUND.is_sound());
        assert!(AnimEvent::AE_NPC_RIGHTFOOT.is_footstep());
        assert!(!AnimEvent::NPC_EVENT_LEFTFOOT.is_footstep());
    }
}
